use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("The file '{path}' was not found")]
    NotFound { path: PathBuf },

    #[error("The file '{path}' is not valid JSON: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unexpected error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MetadataError>;
