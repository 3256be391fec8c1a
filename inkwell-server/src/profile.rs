//! The "recent generations" page.

use crate::store::GenerationRecord;
use inkwell_preview::{prepare, DocumentOptions, SandboxPolicy};
use inkwell_ui::render::{escape_html, render_schema, BASE_STYLES};
use inkwell_ui::{tailwind, GeneratedOutput};
use std::fmt::Write;

pub const PROFILE_RECENT: i64 = 2;
pub const EMPTY_PROFILE_TEXT: &str = "No generations yet.";

fn render_output(record: &GenerationRecord, options: &DocumentOptions) -> String {
    match GeneratedOutput::from_value(&record.output) {
        Ok(GeneratedOutput::Ui { ui }) => {
            let noop = |_: &str| {};
            render_schema(Some(&ui), &noop).to_html()
        }
        Ok(GeneratedOutput::Code { code }) => {
            let prepared = prepare(Some(&code), options);
            format!(
                r#"<iframe title="Preview" class="w-full h-[420px] border-0" sandbox="{}" srcdoc="{}"></iframe>"#,
                SandboxPolicy::preview().attribute(),
                escape_html(&prepared.document)
            )
        }
        Err(e) => format!(
            r#"<p class="text-sm text-gray-500">Unreadable generation: {}</p>"#,
            escape_html(&e.to_string())
        ),
    }
}

pub fn profile_page(records: &[GenerationRecord], options: &DocumentOptions) -> String {
    let mut body = String::new();
    body.push_str(r#"<div class="max-w-5xl mx-auto p-6 flex flex-col gap-6">"#);
    body.push_str(r#"<h1 class="text-xl font-semibold">Your recent generations</h1>"#);
    if records.is_empty() {
        let _ = write!(body, r#"<div class="text-sm text-gray-500">{}</div>"#, EMPTY_PROFILE_TEXT);
    } else {
        body.push_str(r#"<div class="grid grid-cols-1 md:grid-cols-2 gap-6">"#);
        for record in records {
            let _ = write!(
                body,
                r#"<div class="rounded-xl border border-black/10 dark:border-white/15 p-4" data-generation="{}"><div class="text-xs text-gray-500 mb-2">{}</div>{}</div>"#,
                record.id,
                record.created_at.to_rfc3339(),
                render_output(record, options)
            );
        }
        body.push_str("</div>");
    }
    body.push_str("</div>");

    let css = tailwind::generate_css(&body);
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n<title>Recent generations</title>\n<style>{}{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        BASE_STYLES, css, body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use serde_json::json;
    use uuid::Uuid;

    fn record(output: serde_json::Value) -> GenerationRecord {
        GenerationRecord {
            id: Uuid::new_v4(),
            prompt: "p".into(),
            output,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn empty_profile() {
        let page = profile_page(&[], &DocumentOptions::default());
        assert!(page.contains("Your recent generations"));
        assert!(page.contains(EMPTY_PROFILE_TEXT));
    }

    #[test]
    fn renders_ui_and_code() {
        let records = vec![
            record(json!({"ui": {"root": {"type": "button", "text": "Buy now"}}})),
            record(json!({"code": "<section><h2>Pro</h2></section>"})),
        ];
        let page = profile_page(&records, &DocumentOptions::default());
        assert!(page.contains(">Buy now</button>"));
        assert!(page.contains("sandbox=\"allow-forms"));
        assert!(page.contains("&lt;h2&gt;Pro&lt;/h2&gt;"));
        assert!(page.contains("1970-01-01T00:00:00+00:00"));
    }

    #[test]
    fn unreadable_output_is_shown_not_fatal() {
        let page = profile_page(&[record(json!(42))], &DocumentOptions::default());
        assert!(page.contains("Unreadable generation"));
    }
}
