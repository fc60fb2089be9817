use thiserror::Error;

/// Failures a single lookup step can run into.
///
/// Resolvers return these; the pipeline never lets one escape to the caller
/// and records it as a [`crate::Diagnostic`] instead.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("city name is empty")]
    EmptyQuery,

    /// Connection failure, timeout or unreadable body. The request URL is
    /// stripped since it carries the API key.
    #[error("network failure: {0}")]
    Network(reqwest::Error),

    #[error(
        "no OpenWeather API key configured; run `citylookup configure` or set {}",
        crate::config::API_KEY_ENV
    )]
    MissingApiKey,

    /// The body was not JSON, or lacked a field we rely on.
    #[error("unexpected response: {0}")]
    Parse(String),

    #[error("upstream rejected the request with status {0}")]
    UpstreamRejected(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        LookupError::Network(err.without_url())
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(err: serde_json::Error) -> Self {
        LookupError::Parse(err.to_string())
    }
}
