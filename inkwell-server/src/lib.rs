//! HTTP surface for inkwell.
//!
//! Routes turn a prompt (plus, for a reprompt, the previous UI and an
//! exported sketch) into a generated UI tree or component code, record it,
//! and render stored generations back as sandboxed previews.

pub mod config;
pub mod error;
pub mod generator;
pub mod images;
pub mod profile;
pub mod routes;
pub mod store;
pub mod templates;

pub use config::{GeneratorMode, ServerConfig};
pub use error::{ApiError, GenerationError};
pub use routes::{router, AppState};
