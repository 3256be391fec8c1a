//! Generated UI element tree.
//!
//! Generated JSON drifts: types go missing, styles arrive hyphenated, ids come
//! back as numbers. Reading never fails. Anything that cannot be understood is
//! dropped and the node keeps whatever it can still render.

use crate::error::{json_type_name, UiError, UiResult};
use crate::style::{normalize_style, StyleMap};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Nodes nested deeper than this are dropped when a tree is read.
pub const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Container,
    Text,
    Button,
    Image,
    Input,
    Card,
    /// A type outside the closed set. Renders nothing.
    Unrecognized(String),
}

impl ElementKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "container" => ElementKind::Container,
            "text" => ElementKind::Text,
            "button" => ElementKind::Button,
            "image" => ElementKind::Image,
            "input" => ElementKind::Input,
            "card" => ElementKind::Card,
            other => ElementKind::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ElementKind::Container => "container",
            ElementKind::Text => "text",
            ElementKind::Button => "button",
            ElementKind::Image => "image",
            ElementKind::Input => "input",
            ElementKind::Card => "card",
            ElementKind::Unrecognized(s) => s,
        }
    }
}

impl Serialize for ElementKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiElement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ElementKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<UiElement>>,
}

impl UiElement {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn container(class_name: &str, children: Vec<UiElement>) -> Self {
        Self::new(ElementKind::Container)
            .with_class(class_name)
            .with_children(children)
    }

    pub fn card(children: Vec<UiElement>) -> Self {
        Self::new(ElementKind::Card).with_children(children)
    }

    pub fn text(class_name: &str, text: &str) -> Self {
        Self::new(ElementKind::Text).with_class(class_name).with_text(text)
    }

    pub fn button(label: &str) -> Self {
        Self::new(ElementKind::Button).with_text(label)
    }

    pub fn input(placeholder: &str) -> Self {
        Self {
            placeholder: Some(placeholder.to_string()),
            ..Self::new(ElementKind::Input)
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_class(mut self, class_name: &str) -> Self {
        self.class_name = Some(class_name.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn with_children(mut self, children: Vec<UiElement>) -> Self {
        self.children = Some(children);
        self
    }

    /// Reads a node leniently. Non-object values yield an untyped node.
    pub fn from_value(value: &Value) -> Self {
        read_element(value, 0)
    }

    /// The type this node renders as, after coercion.
    ///
    /// Rule order: string `text` (with or without `href`) is text, then a
    /// `children` field makes a container, otherwise the node stays untyped.
    pub fn resolved_kind(&self) -> Option<ElementKind> {
        if let Some(kind) = &self.kind {
            return Some(kind.clone());
        }
        if self.text.is_some() {
            Some(ElementKind::Text)
        } else if self.children.is_some() {
            Some(ElementKind::Container)
        } else {
            None
        }
    }

    pub fn children(&self) -> &[UiElement] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Number of levels in this subtree, counting this node.
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(UiElement::depth).max().unwrap_or(0)
    }

    /// Every node in the subtree, depth first, this node included.
    pub fn descendants(&self) -> Vec<&UiElement> {
        let mut out = vec![self];
        for child in self.children() {
            out.extend(child.descendants());
        }
        out
    }
}

impl<'de> Deserialize<'de> for UiElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(UiElement::from_value(&value))
    }
}

/// `{ root: UIElement }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedUiSchema {
    pub root: UiElement,
}

impl GeneratedUiSchema {
    pub fn new(root: UiElement) -> Self {
        Self { root }
    }

    pub fn from_value(value: &Value) -> UiResult<Self> {
        let obj = value.as_object().ok_or(UiError::NotAnObject {
            found: json_type_name(value),
        })?;
        let root = obj.get("root").ok_or(UiError::MissingField {
            kind: "ui".to_string(),
            field: "root",
        })?;
        Ok(Self {
            root: UiElement::from_value(root),
        })
    }
}

impl<'de> Deserialize<'de> for GeneratedUiSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        GeneratedUiSchema::from_value(&value).map_err(D::Error::custom)
    }
}

/// Applies the type-inference rules to a raw JSON node.
///
/// Only nodes without a usable `type` (missing, `null`, `""`) are touched.
/// `coerce(&coerce(x)) == coerce(x)` for every input.
pub fn coerce(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return value.clone();
    };
    if has_type(obj) {
        return value.clone();
    }
    match infer_kind(obj) {
        Some(kind) => {
            let mut out = obj.clone();
            out.insert("type".to_string(), Value::String(kind.as_str().to_string()));
            Value::Object(out)
        }
        None => value.clone(),
    }
}

fn has_type(obj: &Map<String, Value>) -> bool {
    obj.get("type").map(truthy).unwrap_or(false)
}

fn infer_kind(obj: &Map<String, Value>) -> Option<ElementKind> {
    let has_string_text = matches!(obj.get("text"), Some(Value::String(_)));
    let has_href = obj.get("href").map(truthy).unwrap_or(false);
    if has_string_text && has_href {
        return Some(ElementKind::Text);
    }
    if has_string_text {
        return Some(ElementKind::Text);
    }
    if obj.get("children").map(truthy).unwrap_or(false) {
        return Some(ElementKind::Container);
    }
    None
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn read_element(value: &Value, depth: usize) -> UiElement {
    let Some(obj) = value.as_object() else {
        return UiElement::default();
    };

    let kind = if has_type(obj) {
        obj.get("type").map(|t| match t {
            Value::String(s) => ElementKind::parse(s),
            other => ElementKind::Unrecognized(other.to_string()),
        })
    } else {
        infer_kind(obj)
    };

    // Non-array children still count as "has children" but contribute no nodes.
    let children = match obj.get("children") {
        Some(Value::Array(items)) if depth + 1 < MAX_DEPTH => Some(
            items
                .iter()
                .map(|child| read_element(child, depth + 1))
                .collect(),
        ),
        Some(Value::Array(_)) => Some(Vec::new()),
        Some(other) if truthy(other) => Some(Vec::new()),
        _ => None,
    };

    UiElement {
        id: obj.get("id").and_then(scalar_string),
        kind,
        class_name: string_field(obj, "className"),
        style: obj.get("style").and_then(normalize_style),
        text: string_field(obj, "text"),
        href: obj
            .get("href")
            .filter(|v| truthy(v))
            .and_then(scalar_string),
        placeholder: string_field(obj, "placeholder"),
        src: string_field(obj, "src"),
        children,
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
