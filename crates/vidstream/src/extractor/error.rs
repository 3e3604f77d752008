use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// A static crypto parameter is missing while adaptive derivation is
    /// disabled. Raised before any network activity.
    #[error("missing crypto parameter: {0}")]
    MissingCryptoConfig(&'static str),
    /// An adaptive key/IV/lookup step produced no value. Degrades the
    /// encrypted-endpoint strategy to no output, never the whole request.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("crypto error: {0}")]
    CryptoError(String),
    #[error("decode error: {0}")]
    DecodeError(String),
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("no sources found")]
    NoSourcesFound,
    #[error("other: {0}")]
    Other(String),
}
