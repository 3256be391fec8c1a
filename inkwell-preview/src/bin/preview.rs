use inkwell_preview::realm::DEFAULT_TIMEOUT;
use inkwell_preview::{preflight, prepare, DocumentOptions, PreflightOutcome, SourceShape};
use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;
use std::time::Duration;

fn usage() -> ! {
    eprintln!("Usage: preview [--check] [--timeout-ms <ms>] [file|-]");
    eprintln!();
    eprintln!("Prints the boundary document for generated code read from a file or stdin.");
    eprintln!("With --check, evaluates components headlessly and reports the outcome.");
    process::exit(1);
}

fn main() {
    let mut check = false;
    let mut timeout = DEFAULT_TIMEOUT;
    let mut path: Option<String> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--check" => check = true,
            "--timeout-ms" => match args.next().and_then(|v| v.parse::<u64>().ok()) {
                Some(ms) => timeout = Duration::from_millis(ms),
                None => usage(),
            },
            "-h" | "--help" => usage(),
            _ if path.is_none() => path = Some(arg),
            _ => usage(),
        }
    }

    let code = match read_input(path.as_deref()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("✗ Failed to read input: {}", e);
            process::exit(1);
        }
    };

    let options = DocumentOptions::from_asset_setting(env::var("INKWELL_PREVIEW_ASSETS").ok().as_deref());
    let prepared = prepare(Some(&code), &options);

    if !check {
        print!("{}", prepared.document);
        return;
    }

    match prepared.shape {
        None => println!("✓ empty: placeholder document"),
        Some(SourceShape::Component) => process::exit(report(&code, timeout)),
        Some(shape) => println!("✓ {}: static document, nothing to evaluate", shape.as_str()),
    }
}

fn read_input(path: Option<&str>) -> io::Result<String> {
    match path {
        None | Some("-") => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(p) => fs::read_to_string(p),
    }
}

fn report(code: &str, timeout: Duration) -> i32 {
    match preflight(code, timeout) {
        Ok(PreflightOutcome::Mounted { entry, elements }) => {
            let nodes: usize = elements.iter().map(|n| n.count()).sum();
            println!("✓ component: mounted {} ({} nodes)", entry, nodes);
            0
        }
        Ok(failure) => {
            let phase = failure.phase().map(|p| format!("{:?}", p).to_lowercase());
            eprintln!(
                "✗ component: {} error",
                phase.unwrap_or_else(|| "unknown".to_string())
            );
            if let Some(message) = failure.message() {
                eprintln!("    {}", message);
            }
            1
        }
        Err(e) => {
            eprintln!("✗ component: {}", e);
            1
        }
    }
}
