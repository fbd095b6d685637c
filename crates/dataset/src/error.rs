use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Nothing to render: {0}")]
    NothingToRender(String),

    #[error("Failed to load image: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] pdi_common::PdiError),
}

pub type Result<T> = std::result::Result<T, DatasetError>;
