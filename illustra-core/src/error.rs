//! Render error types.
//!
//! Scene construction never fails: degenerate input becomes an empty node and
//! malformed faces are skipped. The only failure boundary is the rasterization
//! backend, reported through [`RenderError`].

use thiserror::Error;

/// Errors a rasterization backend can report for one render call
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RenderError {
    /// The backend could not allocate a buffer, vertex array or similar
    #[error("backend resources exhausted while uploading {what}")]
    ResourceExhausted {
        /// The resource that could not be created.
        what: String,
    },

    /// A shader program failed to compile or link
    #[error("shader compilation failed: {0}")]
    ShaderCompilation(String),

    /// No drawing context is available (lost or never created)
    #[error("rendering context unavailable: {0}")]
    ContextUnavailable(String),

    /// Any other backend failure
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
