use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Query refused: {0}")]
    Refused(String),

    #[error("No healthy upstreams available")]
    NoHealthyUpstreams,

    #[error("Upstream {server} timed out")]
    UpstreamTimeout { server: String },

    #[error("Upstream {server} network error: {message}")]
    UpstreamNetwork { server: String, message: String },

    #[error("Circuit open for upstream {server}")]
    CircuitOpen { server: String },

    #[error("Query deadline exceeded")]
    DeadlineExceeded,

    #[error("List source '{list_source}' failed: {message}")]
    SourceLoad { list_source: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResolveError {
    /// Transport-level faults are retryable against another upstream;
    /// protocol rcodes carried inside a valid response never surface here.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ResolveError::UpstreamTimeout { .. }
                | ResolveError::UpstreamNetwork { .. }
                | ResolveError::CircuitOpen { .. }
                | ResolveError::NoHealthyUpstreams
        )
    }
}
