//! Error type shared by every stage of the annotations pipeline.
//!
//! Only two lookups downgrade absence into a default value (the
//! singular adapter accessors and `Annotation::argument`); everything
//! else reaches the caller through [`AnnotationsError`].

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnnotationsError>;

#[derive(Debug, Error)]
pub enum AnnotationsError {
    /// A raw expression node carried a `type` tag no variant maps to.
    #[error("The expression '{tag}' is unknown")]
    UnknownExpression { tag: String },

    /// The docblock grammar rejected a comment.
    #[error("{message} in {file} on line {line}")]
    Syntax {
        message: String,
        file: String,
        line: u32,
    },

    /// `Collection::get` found no annotation with the requested name.
    #[error("Collection doesn't have an annotation called '{name}'")]
    NotFound { name: String },

    /// Factory configuration was incomplete or named an unknown adapter.
    #[error("{0}")]
    Config(String),

    /// The introspection source has no declaration for the class.
    #[error("Class '{class}' does not exist")]
    ClassNotFound { class: String },

    #[error("Could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cached payload could not be encoded or decoded.
    #[error("Invalid annotations payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnnotationsError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        AnnotationsError::Config(message.into())
    }
}
