use std::time::Duration;

use thiserror::Error;

/// Failures while driving the browser or reading the scraped site.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Timed out after {}s waiting for selector: {selector}", timeout.as_secs())]
    SelectorTimeout { selector: String, timeout: Duration },

    #[error("Result card has no link: {selector}")]
    MissingLink { selector: String },

    #[error("Invalid CSS selector: {selector}")]
    InvalidSelector { selector: String },

    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Unparseable price text: {text:?}")]
    PriceParse { text: String },
}

/// Failures while reducing a price list to a single value.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AggregateError {
    #[error("No prices available for aggregation")]
    EmptyInput,

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Rounded price does not fit in 64 bits")]
    Overflow,
}

/// Everything that can sink a single product job.
#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("Job aborted: {0}")]
    Aborted(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Webhook responded with {status}: {body}")]
    Forwarding { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AggregateError> for AppError {
    fn from(err: AggregateError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
