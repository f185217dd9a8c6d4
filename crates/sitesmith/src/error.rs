//! Error types for the sitesmith generator.

use thiserror::Error;

/// All errors that can occur while building a site
#[derive(Error, Debug)]
pub enum SiteError {
    #[error("Invalid template root: {message}")]
    TemplateRoot { message: String },

    #[error("Invalid template name '{name}': {message}")]
    TemplateName { name: String, message: String },

    #[error("Template not found: {name}")]
    TemplateNotFound { name: String },

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Unknown page '{name}'")]
    UnknownPage { name: String },

    #[error("Invalid site input: {0}")]
    Input(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors raised while fetching or decoding a product feed.
///
/// These never escape context sanitization; the caller replaces them with an
/// empty product list.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for sitesmith operations
pub type Result<T> = std::result::Result<T, SiteError>;
