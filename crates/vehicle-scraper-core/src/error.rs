use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the vehicle-scraper library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decode or encode error
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Reference table could not be parsed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Provenance index or config file could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport-level failure while downloading an image
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// Download did not finish before its deadline
    #[error("Fetch of {url} timed out after {seconds}s")]
    FetchTimeout { url: String, seconds: u64 },

    /// Browser automation failure
    #[error("Browser error: {0}")]
    Browser(String),

    /// File not found error
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Browser(err.to_string())
    }
}
