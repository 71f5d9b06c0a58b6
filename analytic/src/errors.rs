use thiserror::Error;

/// A result type for acquisition function errors
pub type Result<T> = std::result::Result<T, AcqError>;

/// An error when building or evaluating an acquisition function
#[derive(Error, Debug)]
pub enum AcqError {
    /// When configuration is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfigError(String),
    /// When candidate points, posterior outputs or parameters have unexpected shapes
    #[error("Shape error: {0}")]
    ShapeError(String),
    /// When the requested operation is not available
    #[error("Unsupported: {0}")]
    UnsupportedError(String),
    /// When the surrogate fails
    #[error("GP error")]
    GpError(#[from] acqbox_gp::GpError),
}
