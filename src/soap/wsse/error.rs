use crate::{crypto, xml};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request body is not a well-formed SOAP envelope
    #[error("Malformed SOAP request: {0}")]
    MalformedRequest(String),

    #[error("Unknown namespace prefix '{0}'")]
    UnknownNamespace(String),

    /// The external signer reported a failure
    #[error("External signer failed with {kind}: {message}")]
    Signing { kind: String, message: String },

    #[error("Failed to build security header: {0}")]
    HeaderConstruction(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("XML processing error: {0}")]
    Xml(String),
}

impl From<xml::Error> for Error {
    fn from(err: xml::Error) -> Self {
        match err {
            xml::Error::Parse(msg) => Error::MalformedRequest(msg),
            xml::Error::UnknownNamespace(prefix) => Error::UnknownNamespace(prefix),
            other => Error::Xml(other.to_string()),
        }
    }
}

impl From<crypto::Error> for Error {
    fn from(err: crypto::Error) -> Self {
        Error::HeaderConstruction(err.to_string())
    }
}
