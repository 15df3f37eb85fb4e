mod error;
mod header;
mod remote;
mod signer;
#[cfg(test)]
mod tests;
mod timestamp;
mod username_token;

pub use error::Error;
pub use header::SecurityHeader;
pub use remote::{DECODE_ERROR, RemoteSigner, TRANSPORT_ERROR};
pub use signer::{ExternalSigner, INVALID_SIGNER_RESULT, SignerRegistration, SignerResult};
pub use timestamp::{DEFAULT_TTL_SECONDS, Timestamp};
pub use username_token::{NONCE_LEN, PasswordType, UserCredentials, UsernameToken, password_digest};

use chrono::{DateTime, SecondsFormat, Utc};

pub type Result<T> = std::result::Result<T, Error>;

// Namespaces
pub mod ns {
    pub const WSSE: &str =
        "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";
    pub const WSU: &str =
        "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";
    pub const DS: &str = "http://www.w3.org/2000/09/xmldsig#";
}

pub mod prefix {
    pub const WSSE: &str = "wsse";
    pub const WSU: &str = "wsu";
    pub const DS: &str = "ds";
}

// Token profile URIs as per the UsernameToken Profile 1.0 and SOAP Message Security 1.0
pub mod token_profile {
    pub const PASSWORD_TEXT: &str = "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordText";
    pub const PASSWORD_DIGEST: &str = "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordDigest";
    pub const BASE64_BINARY: &str = "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary";
}

/// Formats an instant the way `wsu:Created`/`wsu:Expires` carry it
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}
