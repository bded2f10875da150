//! Image backend boundary

/// Reference to one produced artifact, e.g. a storage URL or object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef(pub String);

/// Terminal outcome of one backend call. The backend owns its own retry loop
/// for the transient classes (rate limits, flaky upstreams); an error here
/// means that budget is exhausted and the call is final.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("backend rate limited, retry budget exhausted")]
    RateLimited,
    #[error("backend unavailable, retry budget exhausted")]
    ServerUnavailable,
    #[error("backend failure: {0}")]
    Fatal(String),
}

/// A concrete image generator. `n` is guaranteed by the driver to never
/// exceed the configured per-call capacity. Each call is all-or-nothing:
/// exactly `n` artifacts back, or an error.
pub trait ImageBackend: Send + Sync {
    fn generate(&self, prompt: &str, n: u32) -> Result<Vec<ArtifactRef>, BatchError>;
}
