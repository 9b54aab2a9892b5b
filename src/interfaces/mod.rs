pub mod converter;

use std::fmt;

use thiserror::Error;

pub use converter::{convert_file, convert_lines, ConversionReport, LineFailure};

/// Files a run cannot do without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Input,
    Template,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Input => f.write_str("Input"),
            ResourceKind::Template => f.write_str("Template"),
        }
    }
}

/// Errors that abort a conversion run.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("{kind} file {path} not found")]
    ResourceMissing { kind: ResourceKind, path: String },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid template {path}: {reason}")]
    TemplateParse { path: String, reason: String },

    #[error("Invalid template structure: {0}")]
    TemplateShape(String),

    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    /// Maps a read error, turning "not found" into [`ConvertError::ResourceMissing`].
    pub(crate) fn from_read(kind: ResourceKind, path: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConvertError::ResourceMissing {
                kind,
                path: path.to_string(),
            }
        } else {
            ConvertError::Read {
                path: path.to_string(),
                source,
            }
        }
    }
}
