use thiserror::Error;

/// Failure of a single resolution step.
///
/// These never reach callers of the pipeline: the strategy driver logs them
/// at debug level and moves on to the next strategy.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid {name} header value: {reason}")]
    InvalidHeader { name: &'static str, reason: String },

    #[error("no usable result from {strategy}")]
    NoMatch { strategy: &'static str },

    #[error("browser error: {0}")]
    Browser(#[from] crate::browser::BrowserError),
}

impl ResolveError {
    pub(crate) fn invalid_url(url: &str, err: impl std::fmt::Display) -> Self {
        Self::InvalidUrl {
            url: url.to_owned(),
            reason: err.to_string(),
        }
    }
}
