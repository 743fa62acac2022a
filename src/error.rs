use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Ignoring invalid header format: {value:?}. Expected 'Key: Value'.")]
    MalformedHeader { value: String },
    #[error("Ignoring header {value:?}: {reason}")]
    RejectedHeader { value: String, reason: String },
    #[error("Invalid HTTP method '{method}'")]
    InvalidMethod { method: String },
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Error creating request: {source}")]
    Build {
        #[source]
        source: hyper::http::Error,
    },
    #[error("Error sending request: {source}")]
    Transport {
        #[source]
        source: hyper_util::client::legacy::Error,
    },
    #[error("Error sending request: timed out after {timeout:?}")]
    Timeout { timeout: Duration },
    #[error("Error reading response body: {source}")]
    BodyDrain {
        #[source]
        source: hyper::Error,
    },
}

impl RequestError {
    /// Build errors happen before anything touches the network.
    pub fn is_build(&self) -> bool {
        matches!(
            self,
            Self::InvalidMethod { .. } | Self::InvalidUrl { .. } | Self::Build { .. }
        )
    }
}

pub type RequestResult<T> = Result<T, RequestError>;
