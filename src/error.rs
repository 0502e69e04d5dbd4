use std::path::PathBuf;

use thiserror::Error;

/// Fatal problems found while loading configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} missing: set it in the environment or in the [ai] section of the config file")]
    MissingApiKey(&'static str),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid bind address '{0}'")]
    InvalidBind(String),

    #[error("Invalid scrub rules: {0}")]
    InvalidScrubRules(String),
}

/// An uploaded file could not be read as the format it claims to be.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to parse email message: {0}")]
    InternetMessage(String),

    #[error("Failed to parse Outlook message: {0}")]
    CompoundDocument(String),

    #[error("Failed to stage upload for parsing: {0}")]
    Staging(#[from] std::io::Error),
}

/// The summarization service call failed.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Failed to reach summarization service: {0}")]
    Transport(String),

    #[error("Summarization service error ({status}): {body}")]
    Service { status: u16, body: String },

    #[error("Failed to parse summarization response: {0}")]
    Malformed(String),

    #[error("No response content from summarization service")]
    EmptyResponse,
}

impl From<reqwest::Error> for GatewayError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            GatewayError::Malformed(error.to_string())
        } else {
            GatewayError::Transport(error.to_string())
        }
    }
}
