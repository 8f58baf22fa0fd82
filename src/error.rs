use thiserror::Error;

#[derive(Error, Debug)]
pub enum PcsdlError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("Placement failed: {0}")]
    Placement(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, PcsdlError>;
