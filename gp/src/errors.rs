use thiserror::Error;

/// A result type for GP surrogate modeling
pub type Result<T> = std::result::Result<T, GpError>;

/// An error when building, conditioning or querying a [`FixedNoiseGp`](crate::FixedNoiseGp)
/// or when sampling its posterior
#[derive(Error, Debug)]
pub enum GpError {
    /// When linear algebra computation fails
    #[error(transparent)]
    LinalgError(#[from] linfa_linalg::LinalgError),
    /// When a value is invalid
    #[error("InvalidValue error: {0}")]
    InvalidValueError(String),
    /// When the model does not provide the requested capability
    #[error("Unsupported: {0}")]
    UnsupportedError(String),
    /// When an array cannot be reshaped or broadcast
    #[error("Shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),
}
