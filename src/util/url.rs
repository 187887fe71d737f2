use thiserror::Error;
use url::{ParseError, Url};

/// Errors that can occur while validating a feed URL.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    Invalid(#[from] ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    Scheme(String),
}

/// Validates a URL string for use as a feed source.
///
/// Only absolute `http`/`https` URLs are accepted. Hostless forms like
/// `http://` already fail parsing, so a validated URL always has a host.
/// Runs before any repository write so a typo never leaves a half-created
/// feed behind.
pub fn validate_feed_url(raw: &str) -> Result<Url, UrlError> {
    let url = Url::parse(raw.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::Scheme(scheme.to_owned())),
    }

    Ok(url)
}
