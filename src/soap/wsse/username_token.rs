use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, SubsecRound, Utc};
use secrecy::{ExposeSecret, SecretString};

use crate::crypto::{HashAlg, random_bytes};
use crate::soap::wsse::{Result, format_instant, ns, prefix, token_profile};
use crate::xml::Element;

/// Raw nonce length in bytes
pub const NONCE_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordType {
    Text,
    Digest,
}

impl PasswordType {
    pub fn uri(self) -> &'static str {
        match self {
            Self::Text => token_profile::PASSWORD_TEXT,
            Self::Digest => token_profile::PASSWORD_DIGEST,
        }
    }
}

/// Credentials a `wsse:UsernameToken` is generated from
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub username: String,
    pub password: SecretString,
    pub use_digest: bool,
}

impl UserCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<SecretString>, use_digest: bool) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            use_digest,
        }
    }

    pub fn password_type(&self) -> PasswordType {
        if self.use_digest {
            PasswordType::Digest
        } else {
            PasswordType::Text
        }
    }
}

/// A generated `wsse:UsernameToken`.
///
/// Every token carries a fresh nonce and creation time. With
/// [`PasswordType::Digest`] the password element holds
/// `Base64(SHA-1(nonce ++ created ++ password))` instead of the password.
#[derive(Clone, PartialEq, Eq)]
pub struct UsernameToken {
    pub id: String,
    pub username: String,
    pub password_type: PasswordType,
    password: String,
    /// Base64 encoded nonce
    pub nonce: String,
    pub created: String,
}

impl UsernameToken {
    pub fn new(credentials: &UserCredentials, now: DateTime<Utc>) -> Result<Self> {
        let nonce = random_bytes(NONCE_LEN)?;
        Self::with_nonce(credentials, now, &nonce)
    }

    /// Build a token from a caller supplied raw nonce
    pub fn with_nonce(credentials: &UserCredentials, now: DateTime<Utc>, nonce: &[u8]) -> Result<Self> {
        let created = format_instant(&now.trunc_subsecs(0));
        let password_type = credentials.password_type();
        let secret = credentials.password.expose_secret();

        let password = match password_type {
            PasswordType::Text => secret.to_string(),
            PasswordType::Digest => password_digest(nonce, &created, secret)?,
        };

        Ok(Self {
            id: format!("UsernameToken-{}", uuid::Uuid::new_v4()),
            username: credentials.username.clone(),
            password_type,
            password,
            nonce: BASE64.encode(nonce),
            created,
        })
    }

    /// Value of the `wsse:Password` element
    pub fn password_value(&self) -> &str {
        &self.password
    }

    pub fn to_element(&self) -> Element {
        let wsse = |local: &str| Element::new(format!("{}:{local}", prefix::WSSE), Some(ns::WSSE));

        Element::new(format!("{}:UsernameToken", prefix::WSSE), Some(ns::WSSE))
            .with_attribute_ns(&format!("{}:Id", prefix::WSU), ns::WSU, &self.id)
            .with_child(wsse("Username").with_text(&self.username))
            .with_child(
                wsse("Password")
                    .with_attribute("Type", self.password_type.uri())
                    .with_text(&self.password),
            )
            .with_child(
                wsse("Nonce")
                    .with_attribute("EncodingType", token_profile::BASE64_BINARY)
                    .with_text(&self.nonce),
            )
            .with_child(
                Element::new(format!("{}:Created", prefix::WSU), Some(ns::WSU))
                    .with_text(&self.created),
            )
    }
}

impl std::fmt::Debug for UsernameToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsernameToken")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_type", &self.password_type)
            .field("password", &"[REDACTED]")
            .field("nonce", &self.nonce)
            .field("created", &self.created)
            .finish()
    }
}

/// `Base64(SHA-1(nonce ++ created ++ password))` over the raw nonce bytes
pub fn password_digest(nonce: &[u8], created: &str, password: &str) -> Result<String> {
    let digest = HashAlg::Sha1.hash_all([nonce, created.as_bytes(), password.as_bytes()])?;
    Ok(BASE64.encode(digest))
}
