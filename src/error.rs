//! Crate-level error types.

use std::fmt;

/// Errors produced at the boundary of the tracer pipeline.
///
/// The numerical core never fails; these cover scene-contract violations
/// and configuration loading.
#[derive(Debug)]
pub enum TracerError {
    /// A scene reference needed for the frame (box, light) is not assigned.
    MissingReference(&'static str),
    /// Settings JSON could not be parsed.
    Config(serde_json::Error),
    /// Settings file could not be read.
    Io(std::io::Error),
}

impl fmt::Display for TracerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingReference(what) => {
                write!(f, "missing scene reference: {what}")
            }
            Self::Config(e) => write!(f, "settings parse error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for TracerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::MissingReference(_) => None,
        }
    }
}

impl From<serde_json::Error> for TracerError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e)
    }
}

impl From<std::io::Error> for TracerError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
