use crate::soap::wsse;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Wsse(#[from] wsse::Error),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
