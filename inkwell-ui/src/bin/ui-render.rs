use inkwell_ui::{render_schema, ui_document, GeneratedOutput, UiError};
use std::env;
use std::fs;
use std::process;

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let check_only = args.iter().any(|a| a == "--check");
    let files: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();

    if files.is_empty() {
        eprintln!("Usage: ui-render [--check] <output.json>...");
        eprintln!();
        eprintln!("Prints the rendered HTML document for each generated output.");
        eprintln!("With --check, prints a one-line summary per file instead.");
        process::exit(1);
    }

    let mut exit_code = 0;
    for path in files {
        match load(path) {
            Ok(output) => {
                if check_only {
                    println!("✓ {} {}", path, summarize(&output));
                } else if let Err(e) = print_document(&output) {
                    eprintln!("✗ {}: {}", path, e);
                    exit_code = 1;
                }
            }
            Err(e) => {
                eprintln!("✗ {}: {}", path, e);
                exit_code = 1;
            }
        }
    }

    process::exit(exit_code);
}

fn load(path: &str) -> Result<GeneratedOutput, UiError> {
    let content = fs::read_to_string(path)
        .map_err(|e| UiError::Format(format!("Failed to read file: {}", e)))?;
    GeneratedOutput::from_json_str(&content)
}

fn summarize(output: &GeneratedOutput) -> String {
    match output {
        GeneratedOutput::Ui { ui } => {
            let noop = |_: &str| {};
            let view = render_schema(Some(ui), &noop);
            format!(
                "ui: {} nodes, {} actions, depth {}",
                view.nodes().len(),
                view.actions().len(),
                ui.root.depth()
            )
        }
        GeneratedOutput::Code { code } => format!("code: {} bytes", code.len()),
    }
}

fn print_document(output: &GeneratedOutput) -> Result<(), UiError> {
    match output {
        GeneratedOutput::Ui { ui } => println!("{}", ui_document(Some(ui))?),
        // Code output is prepared by the preview crate; print it untouched.
        GeneratedOutput::Code { code } => println!("{}", code),
    }
    Ok(())
}
