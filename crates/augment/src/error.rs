use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AugmentError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Failed to create output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] pdi_common::PdiError),
}

pub type Result<T> = std::result::Result<T, AugmentError>;
