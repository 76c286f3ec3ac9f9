use thiserror::Error;

/// Failure of a single call against the Pixela API.
///
/// Every variant is final: the client never retries, so callers surface the
/// error as-is.
#[derive(Debug, Error)]
pub enum PixelaError {
    /// Connection refused, DNS failure, timeout, or a body that could not be read.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// A read endpoint answered with a non-2xx status. The body is kept raw
    /// because Pixela does not promise JSON on errors.
    #[error("Pixela returned HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    /// The body did not match the shape expected for the endpoint.
    #[error("failed to decode Pixela response: {0}")]
    Decode(String),

    /// A polymorphic field matched none of its accepted shapes.
    #[error("unexpected shape for '{field}': {raw}")]
    SchemaMismatch { field: &'static str, raw: String },
}

impl PixelaError {
    /// Machine-readable code, stable across message wording changes.
    pub fn code(&self) -> &'static str {
        match self {
            PixelaError::Transport(_) => codes::TRANSPORT_ERROR,
            PixelaError::Remote { .. } => codes::REMOTE_ERROR,
            PixelaError::Decode(_) => codes::DECODE_ERROR,
            PixelaError::SchemaMismatch { .. } => codes::SCHEMA_MISMATCH,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PixelaError::Transport(err) if err.is_timeout())
    }
}

impl From<reqwest::Error> for PixelaError {
    /// The URL is dropped: webhook paths carry the hash that authorizes them.
    fn from(err: reqwest::Error) -> Self {
        PixelaError::Transport(err.without_url())
    }
}

/// Error codes used across the adapter
pub mod codes {
    pub const TRANSPORT_ERROR: &str = "transport_error";
    pub const REMOTE_ERROR: &str = "remote_error";
    pub const DECODE_ERROR: &str = "decode_error";
    pub const SCHEMA_MISMATCH: &str = "schema_mismatch";
}
