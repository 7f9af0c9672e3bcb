use thiserror::Error;
use url::Url;

/// Errors that can occur while validating the summarization endpoint URL.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
}

/// Validates the URL the summary requests are posted to.
///
/// Unlike URLs taken from untrusted content, the endpoint is configured by
/// the user and usually points at a local server, so localhost and private
/// addresses are accepted. Only the scheme and the presence of a host are
/// enforced.
///
/// # Examples
///
/// ```
/// use daybrief::util::validate_endpoint;
///
/// let url = validate_endpoint("http://localhost:3000/api/newsFetcher").unwrap();
/// assert_eq!(url.path(), "/api/newsFetcher");
///
/// assert!(validate_endpoint("file:///etc/passwd").is_err());
/// assert!(validate_endpoint("not a url").is_err());
/// ```
pub fn validate_endpoint(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}
