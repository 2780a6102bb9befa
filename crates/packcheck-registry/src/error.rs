//! Registry loading errors.

use std::path::PathBuf;

use packcheck_core::PackcheckError;
use thiserror::Error;

/// Failure to load or validate a registry snapshot.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The snapshot file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot is not valid YAML/JSON or does not match the schema.
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// The snapshot parsed but its contents are inconsistent.
    #[error("registry snapshot has {} problem(s): {}", .0.len(), .0.join("; "))]
    Invalid(Vec<String>),
}

impl From<RegistryError> for PackcheckError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Io { source, .. } => PackcheckError::Io(source),
            parse @ RegistryError::Parse { .. } => PackcheckError::Serialization(parse.to_string()),
            invalid @ RegistryError::Invalid(_) => PackcheckError::Registry(invalid.to_string()),
        }
    }
}
