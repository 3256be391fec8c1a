//! Maps a UI element tree onto visual nodes and HTML.
//!
//! Rendering is a pure tree walk. Coercion runs before every dispatch on the
//! node type, unknown types render nothing, and the only side effect is the
//! button action handed to the caller's handler.

use crate::assets::resolve_asset_path;
use crate::element::{ElementKind, GeneratedUiSchema, UiElement, MAX_DEPTH};
use crate::error::UiResult;
use crate::style::StyleMap;
use crate::tailwind;
use std::fmt::Write;

pub const DEFAULT_CARD_CLASS: &str =
    "rounded-xl border border-black/10 dark:border-white/15 bg-white dark:bg-neutral-900 p-6 shadow-sm";
pub const DEFAULT_BUTTON_CLASS: &str = "inline-flex items-center justify-center rounded-md bg-black text-white dark:bg-white dark:text-black px-4 py-2 text-sm font-medium hover:opacity-90";
pub const DEFAULT_INPUT_CLASS: &str =
    "w-full rounded-md border border-black/10 dark:border-white/15 bg-transparent px-3 py-2 text-sm";
pub const EMPTY_STATE_TEXT: &str = "Nothing generated yet.";
const EMPTY_STATE_CLASS: &str = "text-sm text-gray-500 dark:text-gray-400";
const ROOT_CLASS: &str = "w-full h-full";
/// Keys of the blocks `render_schema` wraps around the tree.
const ROOT_KEY: &str = "inkwell:root";
const EMPTY_KEY: &str = "inkwell:empty";

/// Action id reported for buttons without an `id`.
pub const FALLBACK_ACTION: &str = "button";
pub const DEFAULT_BUTTON_LABEL: &str = "Button";

/// Message type posted to the parent frame when a rendered button is clicked.
pub const ACTION_MESSAGE_TYPE: &str = "inkwell-action";

pub const BASE_STYLES: &str = "html,body{margin:0;padding:0;font-family:system-ui,-apple-system,sans-serif;}\
*,*::before,*::after{box-sizing:border-box;}\
button{cursor:pointer;font:inherit;}\
input{font:inherit;color:inherit;}\
img{max-width:100%;display:block;}";

#[derive(Debug, Clone, PartialEq)]
pub enum ViewTag {
    Block,
    Paragraph { text: String },
    Link { href: String, text: String },
    Button { label: String, action: String },
    Image { src: String, alt: String },
    Input { placeholder: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewNode {
    pub key: String,
    pub tag: ViewTag,
    pub class_name: Option<String>,
    pub style: Option<StyleMap>,
    pub children: Vec<ViewNode>,
}

impl ViewNode {
    fn leaf(key: String, tag: ViewTag, el: &UiElement) -> Self {
        Self {
            key,
            tag,
            class_name: el.class_name.clone(),
            style: el.style.clone(),
            children: Vec::new(),
        }
    }

    /// First button under `key`. Other nodes sharing the key are skipped.
    fn find_button(&self, key: &str) -> Option<&str> {
        match &self.tag {
            ViewTag::Button { action, .. } if self.key == key => Some(action),
            _ => self.children.iter().find_map(|c| c.find_button(key)),
        }
    }

    fn walk<'a>(&'a self, out: &mut Vec<&'a ViewNode>) {
        out.push(self);
        for child in &self.children {
            child.walk(out);
        }
    }
}

/// The result of one render: a node tree plus the action handler it reports to.
pub struct RenderedView<'h> {
    root: Option<ViewNode>,
    on_action: &'h dyn Fn(&str),
}

impl<'h> RenderedView<'h> {
    pub fn root(&self) -> Option<&ViewNode> {
        self.root.as_ref()
    }

    /// All nodes, depth first.
    pub fn nodes(&self) -> Vec<&ViewNode> {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            root.walk(&mut out);
        }
        out
    }

    /// `(key, action)` for every button, in document order.
    pub fn actions(&self) -> Vec<(&str, &str)> {
        self.nodes()
            .into_iter()
            .filter_map(|n| match &n.tag {
                ViewTag::Button { action, .. } => Some((n.key.as_str(), action.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Activates the button rendered under `key`.
    ///
    /// Invokes the handler exactly once and returns `true`, or returns `false`
    /// when no button carries that key.
    pub fn activate(&self, key: &str) -> bool {
        match self.root.as_ref().and_then(|r| r.find_button(key)) {
            Some(action) => {
                (self.on_action)(action);
                true
            }
            None => false,
        }
    }

    pub fn to_html(&self) -> String {
        let mut html = String::new();
        if let Some(root) = &self.root {
            write_node(root, &mut html);
        }
        html
    }
}

/// Renders one element (and its subtree). Unrenderable nodes yield an empty view.
pub fn render<'h>(element: &UiElement, on_action: &'h dyn Fn(&str)) -> RenderedView<'h> {
    RenderedView {
        root: render_element(element, 0),
        on_action,
    }
}

/// Renders a whole schema inside the full-size root block, or the empty-state
/// notice when nothing has been generated.
pub fn render_schema<'h>(
    schema: Option<&GeneratedUiSchema>,
    on_action: &'h dyn Fn(&str),
) -> RenderedView<'h> {
    let root = match schema {
        None => ViewNode {
            key: EMPTY_KEY.to_string(),
            tag: ViewTag::Paragraph {
                text: EMPTY_STATE_TEXT.to_string(),
            },
            class_name: Some(EMPTY_STATE_CLASS.to_string()),
            style: None,
            children: Vec::new(),
        },
        Some(schema) => ViewNode {
            key: ROOT_KEY.to_string(),
            tag: ViewTag::Block,
            class_name: Some(ROOT_CLASS.to_string()),
            style: None,
            children: render_element(&schema.root, 0).into_iter().collect(),
        },
    };
    RenderedView {
        root: Some(root),
        on_action,
    }
}

/// Complete HTML document for a schema, with utility CSS for the classes in use.
pub fn ui_document(schema: Option<&GeneratedUiSchema>) -> UiResult<String> {
    let noop = |_: &str| {};
    let body = render_schema(schema, &noop).to_html();
    let css = tailwind::generate_css(&body);

    let mut html = String::new();
    write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Generated UI</title>
<style>{}{}</style>
</head>
<body>
{}
</body>
</html>
"#,
        BASE_STYLES, css, body
    )?;
    Ok(html)
}

fn render_element(el: &UiElement, depth: usize) -> Option<ViewNode> {
    if depth >= MAX_DEPTH {
        return None;
    }
    let key = el.id.clone().unwrap_or_else(random_key);

    let node = match el.resolved_kind()? {
        kind @ (ElementKind::Container | ElementKind::Card) => {
            let class_name = match (&el.class_name, kind == ElementKind::Card) {
                (Some(c), _) => Some(c.clone()),
                (None, true) => Some(DEFAULT_CARD_CLASS.to_string()),
                (None, false) => None,
            };
            ViewNode {
                key,
                tag: ViewTag::Block,
                class_name,
                style: el.style.clone(),
                children: el
                    .children()
                    .iter()
                    .filter_map(|child| render_element(child, depth + 1))
                    .collect(),
            }
        }
        ElementKind::Text => {
            let text = el.text.clone().unwrap_or_default();
            let tag = match &el.href {
                Some(href) => ViewTag::Link {
                    href: href.clone(),
                    text,
                },
                None => ViewTag::Paragraph { text },
            };
            ViewNode::leaf(key, tag, el)
        }
        ElementKind::Button => {
            let tag = ViewTag::Button {
                label: el
                    .text
                    .clone()
                    .unwrap_or_else(|| DEFAULT_BUTTON_LABEL.to_string()),
                action: el.id.clone().unwrap_or_else(|| FALLBACK_ACTION.to_string()),
            };
            let mut node = ViewNode::leaf(key, tag, el);
            node.class_name
                .get_or_insert_with(|| DEFAULT_BUTTON_CLASS.to_string());
            node
        }
        ElementKind::Image => {
            let tag = ViewTag::Image {
                src: resolve_asset_path(el.src.as_deref()),
                alt: el.text.clone().unwrap_or_else(|| "image".to_string()),
            };
            ViewNode::leaf(key, tag, el)
        }
        ElementKind::Input => {
            let tag = ViewTag::Input {
                placeholder: el.placeholder.clone().unwrap_or_default(),
            };
            let mut node = ViewNode::leaf(key, tag, el);
            node.class_name
                .get_or_insert_with(|| DEFAULT_INPUT_CLASS.to_string());
            node
        }
        ElementKind::Unrecognized(_) => return None,
    };
    Some(node)
}

fn random_key() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..10].to_string()
}

fn write_node(node: &ViewNode, html: &mut String) {
    let attrs = common_attrs(node);
    match &node.tag {
        ViewTag::Block => {
            html.push_str(&format!("<div{}>", attrs));
            for child in &node.children {
                write_node(child, html);
            }
            html.push_str("</div>");
        }
        ViewTag::Paragraph { text } => {
            html.push_str(&format!("<p{}>{}</p>", attrs, escape_html(text)));
        }
        ViewTag::Link { href, text } => {
            html.push_str(&format!(
                "<a href=\"{}\"{}>{}</a>",
                escape_html(&safe_href(href)),
                attrs,
                escape_html(text)
            ));
        }
        ViewTag::Button { label, action } => {
            html.push_str(&format!(
                "<button type=\"button\"{} data-action=\"{}\" onclick=\"window.parent.postMessage({{type:'{}',action:this.getAttribute('data-action')}},'*')\">{}</button>",
                attrs,
                escape_html(action),
                ACTION_MESSAGE_TYPE,
                escape_html(label)
            ));
        }
        ViewTag::Image { src, alt } => {
            html.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\"{}>",
                escape_html(src),
                escape_html(alt),
                attrs
            ));
        }
        ViewTag::Input { placeholder } => {
            html.push_str(&format!(
                "<input type=\"text\" placeholder=\"{}\"{}>",
                escape_html(placeholder),
                attrs
            ));
        }
    }
}

fn common_attrs(node: &ViewNode) -> String {
    let mut attrs = String::new();
    if let Some(class) = node.class_name.as_deref().filter(|c| !c.is_empty()) {
        attrs.push_str(&format!(" class=\"{}\"", escape_html(class)));
    }
    if let Some(style) = node.style.as_ref().filter(|s| !s.is_empty()) {
        attrs.push_str(&format!(" style=\"{}\"", escape_html(&style.to_css())));
    }
    attrs
}

/// Script URLs never reach the document.
fn safe_href(href: &str) -> String {
    let lowered: String = href
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    if lowered.starts_with("javascript:") || lowered.starts_with("vbscript:") {
        "#".to_string()
    } else {
        href.to_string()
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    fn element(v: serde_json::Value) -> UiElement {
        UiElement::from_value(&v)
    }

    #[test]
    fn card_gets_default_class() {
        let noop = |_: &str| {};
        let view = render(&element(json!({"type": "card", "children": []})), &noop);
        assert_eq!(view.root().unwrap().class_name.as_deref(), Some(DEFAULT_CARD_CLASS));
    }

    #[test]
    fn container_has_no_default_class() {
        let noop = |_: &str| {};
        let view = render(&element(json!({"type": "container"})), &noop);
        assert_eq!(view.root().unwrap().class_name, None);
    }

    #[test]
    fn text_with_href_is_link() {
        let noop = |_: &str| {};
        let view = render(&element(json!({"text": "Docs", "href": "/docs"})), &noop);
        assert_eq!(
            view.root().unwrap().tag,
            ViewTag::Link {
                href: "/docs".into(),
                text: "Docs".into()
            }
        );
    }

    #[test]
    fn button_defaults() {
        let noop = |_: &str| {};
        let view = render(&element(json!({"type": "button"})), &noop);
        assert_eq!(
            view.root().unwrap().tag,
            ViewTag::Button {
                label: "Button".into(),
                action: "button".into()
            }
        );
    }

    #[test]
    fn activation_reports_id_once() {
        let calls = RefCell::new(Vec::new());
        let handler = |id: &str| calls.borrow_mut().push(id.to_string());
        let view = render(
            &element(json!({"type": "container", "children": [
                {"type": "button", "id": "save", "text": "Save"},
                {"type": "button", "text": "Anon"}
            ]})),
            &handler,
        );
        assert!(view.activate("save"));
        assert_eq!(*calls.borrow(), vec!["save".to_string()]);

        let (anon_key, anon_action) = view.actions()[1];
        assert_eq!(anon_action, "button");
        assert!(view.activate(anon_key));
        assert_eq!(calls.borrow().len(), 2);
    }

    #[test]
    fn activating_non_button_does_nothing() {
        let calls = RefCell::new(0);
        let handler = |_: &str| *calls.borrow_mut() += 1;
        let view = render(&element(json!({"type": "text", "id": "t", "text": "x"})), &handler);
        assert!(!view.activate("t"));
        assert!(!view.activate("missing"));
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn button_sharing_parent_id_still_activates() {
        let calls = RefCell::new(Vec::new());
        let handler = |id: &str| calls.borrow_mut().push(id.to_string());
        let view = render(
            &element(json!({"type": "container", "id": "save", "children": [
                {"type": "button", "id": "save", "text": "Save"}
            ]})),
            &handler,
        );
        assert!(view.activate("save"));
        assert_eq!(*calls.borrow(), vec!["save".to_string()]);
    }

    #[test]
    fn schema_button_with_root_id_activates() {
        let calls = RefCell::new(Vec::new());
        let handler = |id: &str| calls.borrow_mut().push(id.to_string());
        let schema = GeneratedUiSchema::from_value(
            &json!({"root": {"type": "button", "id": "root", "text": "Go"}}),
        )
        .unwrap();
        let view = render_schema(Some(&schema), &handler);
        assert!(view.activate("root"));
        assert_eq!(*calls.borrow(), vec!["root".to_string()]);
        assert!(!view.activate(ROOT_KEY));
    }

    #[test]
    fn unknown_types_render_nothing() {
        let noop = |_: &str| {};
        assert!(render(&element(json!({"type": "video"})), &noop).root().is_none());
        assert!(render(&element(json!({"className": "x"})), &noop).root().is_none());
        assert!(render(&element(json!(42)), &noop).root().is_none());
    }

    #[test]
    fn image_src_and_alt() {
        let noop = |_: &str| {};
        let view = render(&element(json!({"type": "image", "src": "photos/team.jpg"})), &noop);
        assert_eq!(
            view.root().unwrap().tag,
            ViewTag::Image {
                src: "/images/team".into(),
                alt: "image".into()
            }
        );
    }

    #[test]
    fn html_is_escaped() {
        let noop = |_: &str| {};
        let view = render(&element(json!({"type": "text", "text": "<script>alert(1)</script>"})), &noop);
        let html = view.to_html();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn script_hrefs_neutralized() {
        let noop = |_: &str| {};
        let view = render(&element(json!({"text": "x", "href": "java script:alert(1)"})), &noop);
        assert!(view.to_html().contains("href=\"#\""));
    }

    #[test]
    fn empty_schema_shows_notice() {
        let noop = |_: &str| {};
        let html = render_schema(None, &noop).to_html();
        assert!(html.contains(EMPTY_STATE_TEXT));
    }

    #[test]
    fn keys_fall_back_to_random() {
        let noop = |_: &str| {};
        let view = render(&element(json!({"type": "input"})), &noop);
        assert_eq!(view.root().unwrap().key.len(), 10);
    }
}
