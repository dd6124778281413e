use thiserror::Error;

/// Errors that can occur while driving a VPAID creative
#[derive(Error, Debug)]
pub enum VpaidError {
    #[error("Failed to parse ad parameters: {0}")]
    Parameter(#[from] serde_json::Error),

    #[error("Unknown VPAID event: {0}")]
    UnknownEvent(String),

    #[error("Failed to write creative markup: {0}")]
    Markup(#[from] quick_xml::Error),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Failed to fetch ad parameters: {0}")]
    Fetch(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, VpaidError>;
