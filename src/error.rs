//! Error types for the schema transformer

use std::path::PathBuf;

use thiserror::Error;

/// Result type for transform operations
pub type Result<T> = std::result::Result<T, TransformError>;

/// Schema transform errors
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("$ref '{reference}' (or $dynamicRef '{dynamic_reference}') could not be resolved: unknown schema")]
    UnknownSchema {
        reference: String,
        dynamic_reference: String,
    },

    #[error("failed to parse property {property} for class {class}: {source}")]
    Property {
        property: String,
        class: String,
        #[source]
        source: Box<TransformError>,
    },

    #[error("parent of $ref '{uri}' failed to load")]
    MissingDocument { uri: String },

    #[error("one end of the relation '{from}'({reference}) to '{to}' is missing")]
    MissingRelationEndpoint {
        from: String,
        reference: String,
        to: String,
    },

    #[error("cannot read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse schema {path}: {source}")]
    ParseSchema {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URI '{uri}': {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unknown format: {0}")]
    UnknownFormat(String),

    #[error("file {0} exists but overwrite of file is not allowed")]
    OutputExists(PathBuf),

    #[error("no input files provided")]
    NoInputs,

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TransformError {
    /// Returns true if this error, or the error it wraps, is an unresolved reference.
    pub fn is_unknown_schema(&self) -> bool {
        match self {
            TransformError::UnknownSchema { .. } => true,
            TransformError::Property { source, .. } => source.is_unknown_schema(),
            _ => false,
        }
    }
}
