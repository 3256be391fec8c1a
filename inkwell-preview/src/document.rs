//! HTML documents loaded into the preview boundary.

use crate::boundary::{BoundaryId, BOUNDARY_ERROR_MESSAGE};
use crate::modules::{Neutralized, ENTRY_BINDING};
use inkwell_ui::render::escape_html;
use regex::Regex;
use std::sync::OnceLock;

pub const REACT_CDN_URL: &str = "https://unpkg.com/react@18/umd/react.production.min.js";
pub const REACT_DOM_CDN_URL: &str =
    "https://unpkg.com/react-dom@18/umd/react-dom.production.min.js";
pub const BABEL_CDN_URL: &str = "https://unpkg.com/@babel/standalone/babel.min.js";

pub const MISSING_ENTRY_MESSAGE: &str =
    "No default export found. Export a default component named App.";
pub const PLACEHOLDER_BODY: &str =
    r#"<div style="padding:16px;font-family:system-ui">No code yet.</div>"#;

const VIEWPORT_META: &str = r#"<meta name="viewport" content="width=device-width,initial-scale=1" />"#;
const RESET_MARKER: &str = "data-inkwell-reset";
const RESET_CSS: &str = "html,body{margin:0;padding:0;font-family:system-ui,-apple-system,Segoe UI,Roboto,sans-serif;width:100%;min-height:100vh;overflow-x:hidden}\
*,*::before,*::after{box-sizing:border-box}\
body>*{max-width:100vw}";
const ERROR_BANNER_CSS: &str = "#inkwell-errors{position:fixed;inset:auto 0 0 0;background:#fee2e2;color:#991b1b;padding:8px 12px;font:12px/1.4 monospace;white-space:pre-wrap;display:none;z-index:2147483647}";

/// Where the boundary loads its scripts from, and which boundary it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOptions {
    pub react_url: String,
    pub react_dom_url: String,
    pub babel_url: String,
    pub boundary_id: Option<BoundaryId>,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            react_url: REACT_CDN_URL.to_string(),
            react_dom_url: REACT_DOM_CDN_URL.to_string(),
            babel_url: BABEL_CDN_URL.to_string(),
            boundary_id: None,
        }
    }
}

impl DocumentOptions {
    /// `None` or `"cdn"` uses unpkg; anything else is a base URL serving
    /// `react.production.min.js`, `react-dom.production.min.js` and `babel.min.js`.
    pub fn from_asset_setting(setting: Option<&str>) -> Self {
        match setting.map(str::trim) {
            None | Some("") | Some("cdn") => Self::default(),
            Some(base) => {
                let base = base.trim_end_matches('/');
                Self {
                    react_url: format!("{base}/react.production.min.js"),
                    react_dom_url: format!("{base}/react-dom.production.min.js"),
                    babel_url: format!("{base}/babel.min.js"),
                    boundary_id: None,
                }
            }
        }
    }

    pub fn with_boundary(mut self, id: BoundaryId) -> Self {
        self.boundary_id = Some(id);
        self
    }
}

fn reset_style() -> String {
    format!("<style {RESET_MARKER}>{RESET_CSS}</style>")
}

/// A string literal that is safe to inline in a `<script>` element.
pub fn script_literal(value: serde_json::Value) -> String {
    value
        .to_string()
        .replace("</", "<\\/")
        .replace("<!--", "<\\!--")
}

/// Minimal static document around an HTML body. No script runs.
pub fn static_document(body: &str) -> String {
    format!(
        "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n{VIEWPORT_META}\n{}\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        reset_style()
    )
}

pub fn placeholder_document() -> String {
    static_document(PLACEHOLDER_BODY)
}

/// Static document showing `message` in the boundary's error banner.
pub fn diagnostic_document(message: &str) -> String {
    let body = format!(
        "<div id=\"inkwell-errors\" role=\"alert\" style=\"display:block\">{}</div>",
        escape_html(message)
    );
    format!(
        "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n{VIEWPORT_META}\n{}\n<style>{ERROR_BANNER_CSS}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        reset_style()
    )
}

fn viewport_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)<meta\b[^>]*\bname\s*=\s*["']?viewport"#).expect("valid regex")
    })
}

fn head_close_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)</head\s*>").expect("valid regex"))
}

fn head_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<head(\s[^>]*)?>").expect("valid regex"))
}

fn html_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<html(\s[^>]*)?>").expect("valid regex"))
}

/// Adds a viewport meta (when missing) and the reset style to a full document.
///
/// The injection goes right before `</head>`; failing that after `<head …>`;
/// failing that into a new head after `<html …>`. Documents already carrying
/// the reset are returned unchanged.
pub fn wrap_full_document(source: &str) -> String {
    if source.contains(RESET_MARKER) {
        return source.to_string();
    }

    let mut injection = String::new();
    if !viewport_re().is_match(source) {
        injection.push_str(VIEWPORT_META);
    }
    injection.push_str(&reset_style());

    let mut out = String::with_capacity(source.len() + injection.len() + 16);
    if let Some(m) = head_close_re().find(source) {
        out.push_str(&source[..m.start()]);
        out.push_str(&injection);
        out.push_str(&source[m.start()..]);
    } else if let Some(m) = head_open_re().find(source) {
        out.push_str(&source[..m.end()]);
        out.push_str(&injection);
        out.push_str(&source[m.end()..]);
    } else if let Some(m) = html_open_re().find(source) {
        out.push_str(&source[..m.end()]);
        out.push_str("<head>");
        out.push_str(&injection);
        out.push_str("</head>");
        out.push_str(&source[m.end()..]);
    } else {
        return source.to_string();
    }
    out
}

const BOUNDARY_RUNTIME_JS: &str = r#"(function () {
  var boundary = window.__inkwellBoundary || null;
  var consoleError = console.error;
  function report(phase, err) {
    var message = err && err.stack ? String(err.stack) : String(err && err.message || err);
    var banner = document.getElementById('inkwell-errors');
    if (banner) {
      banner.style.display = 'block';
      banner.textContent = message;
    }
    try {
      window.parent.postMessage({ type: __MESSAGE_TYPE__, boundary: boundary, phase: phase, message: message }, '*');
    } catch (_) {}
  }
  window.__inkwellReport = report;
  window.onerror = function (msg, src, line, col, err) {
    report('render', err || msg);
    return true;
  };
  window.addEventListener('unhandledrejection', function (event) {
    report('async', event.reason);
    event.preventDefault();
  });
  console.error = function () {
    report('console', Array.prototype.slice.call(arguments).join(' '));
    consoleError.apply(console, arguments);
  };
})();"#;

const MOUNT_JS: &str = r#"(function () {
  var report = window.__inkwellReport;
  __ENTRY__ = undefined;
  var compiled;
  try {
    compiled = Babel.transform(__SRC__, {
      filename: 'App.tsx',
      presets: [['env', { modules: 'commonjs' }], 'react', ['typescript', { isTSX: true, allExtensions: true }]]
    }).code;
  } catch (err) {
    report('compile', err);
    return;
  }
  try {
    new Function('React', 'ReactDOM', __RUNNER_PREFIX__ + compiled + __RUNNER_SUFFIX__)(window.React, window.ReactDOM);
  } catch (err) {
    report('module', err);
    return;
  }
  if (!__ENTRY__) {
    report('entry', new Error(__MISSING_ENTRY__));
    return;
  }
  try {
    var container = document.getElementById('root');
    var element = window.React.createElement(__ENTRY__);
    if (window.ReactDOM.createRoot) {
      window.ReactDOM.createRoot(container).render(element);
    } else {
      window.ReactDOM.render(element, container);
    }
  } catch (err) {
    report('render', err);
  }
})();"#;

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// JavaScript that evaluates to the first defined candidate, or `undefined`.
fn candidate_check(candidates: &[String]) -> String {
    let checks: Vec<String> = candidates
        .iter()
        .filter(|c| is_identifier(c))
        .map(|c| format!("(typeof {c} !== 'undefined' ? {c} : undefined)"))
        .collect();
    if checks.is_empty() {
        "undefined".to_string()
    } else {
        checks.join(" || ")
    }
}

pub(crate) fn runner_suffix(candidates: &[String]) -> String {
    format!(
        "\n;{ENTRY_BINDING} = {ENTRY_BINDING} || (module.exports && (module.exports.default || module.exports.App)) || {};\n",
        candidate_check(candidates)
    )
}

pub(crate) const RUNNER_PREFIX: &str = "var module = { exports: {} };\nvar exports = module.exports;\n";

/// Boundary document that transpiles and mounts neutralized component code.
pub fn component_document(code: &Neutralized, options: &DocumentOptions) -> String {
    let boundary = options
        .boundary_id
        .map(|id| serde_json::Value::from(id.to_string()))
        .unwrap_or(serde_json::Value::Null);

    let runtime = BOUNDARY_RUNTIME_JS.replace(
        "__MESSAGE_TYPE__",
        &script_literal(BOUNDARY_ERROR_MESSAGE.into()),
    );
    // User text goes in last so it is never scanned for placeholders.
    let mount = MOUNT_JS
        .replace("__MISSING_ENTRY__", &script_literal(MISSING_ENTRY_MESSAGE.into()))
        .replace("__ENTRY__", ENTRY_BINDING)
        .replace("__RUNNER_PREFIX__", &script_literal(RUNNER_PREFIX.into()))
        .replace("__RUNNER_SUFFIX__", &script_literal(runner_suffix(&code.candidates).into()))
        .replace("__SRC__", &script_literal(code.code.as_str().into()));

    format!(
        r#"<!doctype html>
<html>
<head>
<meta charset="utf-8" />
{VIEWPORT_META}
{reset}
<style>#root{{width:100%;min-height:100vh}}{ERROR_BANNER_CSS}</style>
<script src="{react}"></script>
<script src="{react_dom}"></script>
<script src="{babel}"></script>
</head>
<body>
<div id="root"></div>
<div id="inkwell-errors" role="alert"></div>
<script>window.__inkwellBoundary = {boundary};</script>
<script>
{runtime}
</script>
<script>
{mount}
</script>
</body>
</html>
"#,
        reset = reset_style(),
        react = escape_html(&options.react_url),
        react_dom = escape_html(&options.react_dom_url),
        babel = escape_html(&options.babel_url),
        boundary = script_literal(boundary),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::neutralize;

    #[test]
    fn injects_viewport_before_head_close() {
        let out = wrap_full_document("<html><head><title>x</title></head><body></body></html>");
        assert_eq!(out.matches("name=\"viewport\"").count(), 1);
        let meta = out.find("viewport").unwrap();
        assert!(meta > out.find("<title>").unwrap());
        assert!(meta < out.find("</head>").unwrap());
    }

    #[test]
    fn keeps_existing_viewport() {
        let src = "<html><head><meta name='viewport' content='width=500'></head></html>";
        let out = wrap_full_document(src);
        assert_eq!(out.matches("viewport").count(), 1);
        assert!(out.contains(RESET_MARKER));
    }

    #[test]
    fn creates_head_when_missing() {
        let out = wrap_full_document("<HTML lang=\"en\"><body>Hi</body></HTML>");
        assert!(out.starts_with("<HTML lang=\"en\"><head><meta name=\"viewport\""));
        assert!(out.contains("</head><body>"));
    }

    #[test]
    fn head_without_close_gets_injection_after_open() {
        let out = wrap_full_document("<html><head data-x=\"1\"><body></body></html>");
        assert!(out.starts_with("<html><head data-x=\"1\"><meta name=\"viewport\""));
    }

    #[test]
    fn wrapping_twice_changes_nothing() {
        let once = wrap_full_document("<html><head></head></html>");
        assert_eq!(wrap_full_document(&once), once);
    }

    #[test]
    fn script_literal_cannot_close_the_script() {
        let lit = script_literal("a</script><!--b".into());
        assert!(!lit.contains("</script>"));
        assert!(!lit.contains("<!--"));
    }

    #[test]
    fn component_document_carries_boundary_and_candidates() {
        let id = BoundaryId::new();
        let code = neutralize("function Hero() { return null; }");
        let doc = component_document(&code, &DocumentOptions::default().with_boundary(id));
        assert!(doc.contains(&format!("window.__inkwellBoundary = \"{id}\"")));
        assert!(doc.contains("typeof Hero !== 'undefined'"));
        assert!(doc.contains(REACT_CDN_URL));
        assert!(doc.contains("window.App = undefined;"));
        assert!(doc.contains("createRoot"));
    }

    #[test]
    fn asset_setting_points_at_base_url() {
        let opts = DocumentOptions::from_asset_setting(Some("http://localhost:8080/vendor/"));
        assert_eq!(opts.babel_url, "http://localhost:8080/vendor/babel.min.js");
        assert_eq!(DocumentOptions::from_asset_setting(Some("cdn")), DocumentOptions::default());
    }

    #[test]
    fn diagnostic_document_escapes_message() {
        let doc = diagnostic_document("<b>boom</b>");
        assert!(doc.contains("&lt;b&gt;boom&lt;/b&gt;"));
        assert!(doc.contains("display:block"));
    }
}
