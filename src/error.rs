use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("failed to load image {origin}: {source}")]
    ImageLoad {
        origin: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Degenerate image: {0}")]
    DegenerateImage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient data: need at least {required} samples, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, SignatureError>;
