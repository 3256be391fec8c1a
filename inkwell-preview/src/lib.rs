//! # Inkwell Preview
//!
//! Turns generated code of unknown shape into a document that can be shown
//! inside an isolated preview boundary (a sandboxed iframe).
//!
//! ## Pipeline
//! - [`shape::classify`] decides between a full HTML document, static markup
//!   and a script component.
//! - [`sanitize`] strips fences and invisible characters.
//! - [`modules::neutralize`] removes module syntax from components and binds
//!   the entry point to `window.App`.
//! - [`document`] builds the boundary document; components are transpiled and
//!   mounted inside it, with every failure routed to an error banner and a
//!   one-way report to the parent.
//! - [`boundary::BoundaryHost`] tracks live boundaries per slot.
//! - [`realm::preflight`] evaluates a component headlessly in a boa realm.
//!
//! ## Example
//! ```ignore
//! use inkwell_preview::{prepare, DocumentOptions};
//!
//! let prepared = prepare(Some("export default function App() { return <h1>Hi</h1>; }"),
//!     &DocumentOptions::default());
//! assert!(prepared.document.contains("Babel.transform"));
//! ```

pub mod boundary;
pub mod document;
pub mod error;
pub mod jsx;
pub mod lexer;
pub mod modules;
pub mod realm;
pub mod sanitize;
pub mod shape;

pub use boundary::{
    BoundaryHost, BoundaryId, BoundaryPhase, BoundaryReport, EntrySlot, SandboxCapability,
    SandboxPolicy,
};
pub use document::DocumentOptions;
pub use error::{PreviewError, PreviewResult};
pub use modules::{EntryBinding, Neutralized};
pub use realm::{preflight, MountedNode, PreflightOutcome};
pub use shape::SourceShape;

use document::{component_document, placeholder_document, static_document, wrap_full_document};
use sanitize::harden;

/// A boundary document ready to be loaded, plus what it was made from.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPreview {
    /// `None` for the empty placeholder.
    pub shape: Option<SourceShape>,
    pub document: String,
    /// Present for components only.
    pub neutralized: Option<Neutralized>,
}

/// Prepares generated code for a boundary. Never fails: missing or blank
/// code yields the "No code yet." placeholder.
pub fn prepare(code: Option<&str>, options: &DocumentOptions) -> PreparedPreview {
    let placeholder = || PreparedPreview {
        shape: None,
        document: placeholder_document(),
        neutralized: None,
    };

    let Some(raw) = code.filter(|c| !c.trim().is_empty()) else {
        return placeholder();
    };
    let classified = shape::classify(raw);
    if classified.source.trim().is_empty() {
        return placeholder();
    }
    tracing::debug!(shape = classified.shape.as_str(), rule = ?classified.rule, "classified generated code");

    match classified.shape {
        SourceShape::Document => PreparedPreview {
            shape: Some(SourceShape::Document),
            document: wrap_full_document(&classified.source),
            neutralized: None,
        },
        SourceShape::Markup => PreparedPreview {
            shape: Some(SourceShape::Markup),
            document: static_document(&classified.source),
            neutralized: None,
        },
        SourceShape::Component => {
            let neutralized = modules::neutralize(&harden(&classified.source));
            if neutralized.stripped_lines > 0 {
                tracing::debug!(lines = neutralized.stripped_lines, "removed leftover module lines");
            }
            PreparedPreview {
                shape: Some(SourceShape::Component),
                document: component_document(&neutralized, options),
                neutralized: Some(neutralized),
            }
        }
    }
}
