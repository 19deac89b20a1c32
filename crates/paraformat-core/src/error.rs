use thiserror::Error;

/// Failures while rewriting blocks. Nothing is rolled back: a failed rewrite may leave the
/// tree partially mutated.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum RewriteError {
    #[error("<{tag}> block has no parent element")]
    Detached { tag: String },
    #[error("host rejected {operation}: {message}")]
    Host {
        operation: &'static str,
        message: String,
    },
}

impl RewriteError {
    pub fn host(operation: &'static str, message: impl Into<String>) -> Self {
        RewriteError::Host {
            operation,
            message: message.into(),
        }
    }
}

/// Failures while loading a fixture document.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("invalid xhtml fragment: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("unsupported node in fragment: {0}")]
    UnsupportedNode(String),
}
