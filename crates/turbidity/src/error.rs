use thiserror::Error;

#[derive(Error, Debug)]
pub enum TurbidityError {
    #[error("Frame capture failed: {0}")]
    Capture(String),

    #[error("Invalid input image: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TurbidityError>;
