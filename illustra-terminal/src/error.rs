//! Error types for loading meshes into the terminal viewer.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`LoadError`].
pub type Result<T> = std::result::Result<T, LoadError>;

/// Errors that can occur while reading an STL file.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The data is shorter than the 84-byte binary header.
    #[error("file too small to be a valid STL ({0} bytes)")]
    TooSmall(usize),

    /// The binary triangle count promises more data than is present.
    #[error("unexpected end of file: header declares {declared} triangles, data holds {available}")]
    Truncated {
        /// Triangle count from the header.
        declared: usize,
        /// Complete triangles actually present.
        available: usize,
    },

    /// The ASCII body did not parse.
    #[error("failed to parse ASCII STL: {0}")]
    Ascii(String),

    /// File I/O error.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_truncated() {
        let err = LoadError::Truncated {
            declared: 12,
            available: 3,
        };
        let msg = format!("{err}");
        assert!(msg.contains("12"));
        assert!(msg.contains('3'));
    }

    #[test]
    fn test_error_display_io() {
        let err = LoadError::Io {
            path: PathBuf::from("missing.stl"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(format!("{err}").contains("missing.stl"));
    }
}
