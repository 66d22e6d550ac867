pub mod json;
pub mod svg;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export: no profile loaded")]
    NoProfileLoaded,
    #[error("serialization failed: {0}")]
    SerializationFailed(String),
}
