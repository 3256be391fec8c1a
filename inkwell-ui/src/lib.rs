//! # Inkwell UI
//!
//! Typed model and renderer for generated UI trees.
//!
//! A generator answers with either a tree of UI elements or a code string
//! ([`GeneratedOutput`]). This crate reads trees leniently (drift in the
//! generated JSON never fails a read), applies the type-inference rules,
//! and renders the result into view nodes or a self-contained HTML document.
//!
//! ```ignore
//! use inkwell_ui::{render, GeneratedOutput};
//!
//! let output = GeneratedOutput::from_json_str(r#"{"root":{"text":"Hello"}}"#)?;
//! let schema = output.as_ui().unwrap();
//! let view = render(&schema.root, &|action| println!("clicked {action}"));
//! println!("{}", view.to_html());
//! ```

pub mod assets;
pub mod element;
pub mod error;
pub mod output;
pub mod render;
pub mod style;
pub mod tailwind;

pub use assets::{resolve_asset_path, PLACEHOLDER_PATH};
pub use element::{coerce, ElementKind, GeneratedUiSchema, UiElement, MAX_DEPTH};
pub use error::{UiError, UiResult};
pub use output::GeneratedOutput;
pub use render::{render, render_schema, ui_document, RenderedView, ViewNode, ViewTag};
pub use style::{normalize_style, StyleMap, StyleValue};
