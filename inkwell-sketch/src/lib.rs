//! # Inkwell Sketch
//!
//! Freehand annotation over a rendered result, exported as a single PNG that
//! grounds a follow-up generation request.
//!
//! - [`observer::Container`] reports layout bounds to its observers.
//! - [`overlay::SketchOverlay`] keeps a [`surface::RasterSurface`] the size
//!   of its container and turns pointer or touch input into strokes.
//! - [`overlay::SketchOverlay::export`] encodes the surface; stroke history
//!   is never kept.

pub mod color;
pub mod error;
pub mod observer;
pub mod overlay;
pub mod surface;

pub use color::StrokeColor;
pub use error::{SketchError, SketchResult};
pub use observer::{Bounds, Container, ObserverHandle};
pub use overlay::{ImageBlob, InputDisposition, PointerEvent, SketchOverlay, TouchEvent};
pub use surface::{Point, RasterSurface};
