use thiserror::Error;

pub type SketchResult<T> = Result<T, SketchError>;

#[derive(Error, Debug)]
pub enum SketchError {
    #[error("Invalid stroke color '{0}'. Expected #rgb or #rrggbb")]
    InvalidColor(String),

    #[error("Sketch overlay is disabled")]
    Disabled,

    #[error("Cannot export an empty surface ({width}x{height})")]
    EmptySurface { width: u32, height: u32 },

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}
