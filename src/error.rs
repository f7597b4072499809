use thiserror::Error;

/// Failure taxonomy for a single scrape.
///
/// "Legitimately empty" results are not errors: a caption that matches no
/// table becomes an empty `data` list in the endpoint layer. These variants
/// are for the cases where the caller must know something is wrong.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("failed to fetch {url}: {reason}")]
    UpstreamFetch { url: String, reason: String },

    #[error("unexpected table shape: {0}")]
    ShapeMismatch(String),

    #[error("column `{column}`: cannot convert {value:?} to {target}")]
    Coercion {
        column: String,
        value: String,
        target: &'static str,
    },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("country code `{country_code}` is invalid or has no competitions tracked")]
    InvalidCountry { country_code: String },

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

impl From<regex::Error> for ScrapeError {
    fn from(e: regex::Error) -> Self {
        ScrapeError::Configuration(format!("bad pattern: {e}"))
    }
}

impl From<url::ParseError> for ScrapeError {
    fn from(e: url::ParseError) -> Self {
        ScrapeError::InvalidParameters(format!("bad url: {e}"))
    }
}
