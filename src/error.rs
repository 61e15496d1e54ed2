//! Error types shared by the scraping pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Invalid selector `{css}`: {reason}")]
    Selector { css: String, reason: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("Invalid config value `{field}`: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A listing page no longer matches the expected template.
    #[error("Malformed listing (article block {block}): {reason}")]
    MalformedListing { block: usize, reason: String },

    #[error("Malformed record {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    #[error("Invalid listing range {start}..{end}: {reason}")]
    InvalidRange {
        start: u32,
        end: u32,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
