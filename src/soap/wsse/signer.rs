use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::soap::wsse::{Error, Result};

/// Kind reported when a signer claims success but returns no document
pub const INVALID_SIGNER_RESULT: &str = "InvalidSignerResult";

/// A service that produces the XML-Signature for an outgoing envelope.
///
/// The signer receives the complete serialized envelope, including the
/// security header, and returns the full replacement document.
#[async_trait]
pub trait ExternalSigner: Send + Sync {
    async fn sign_xml(&self, xml: &str) -> SignerResult;
}

/// Outcome of an external signing call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerResult {
    #[serde(default)]
    signed_xml: Option<String>,
    #[serde(default)]
    exception_kind: Option<String>,
    #[serde(default)]
    exception_message: Option<String>,
    #[serde(default)]
    failed: bool,
}

impl SignerResult {
    pub fn signed(xml: impl Into<String>) -> Self {
        Self {
            signed_xml: Some(xml.into()),
            ..Default::default()
        }
    }

    pub fn failure(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            signed_xml: None,
            exception_kind: Some(kind.into()),
            exception_message: Some(message.into()),
            failed: true,
        }
    }

    pub fn signed_xml(&self) -> Option<&str> {
        self.signed_xml.as_deref()
    }

    pub fn exception_kind(&self) -> Option<&str> {
        self.exception_kind.as_deref()
    }

    pub fn exception_message(&self) -> Option<&str> {
        self.exception_message.as_deref()
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// The signed document, or the signer's failure as [`Error::Signing`]
    pub fn into_result(self) -> Result<String> {
        if self.failed {
            return Err(Error::Signing {
                kind: self.exception_kind.unwrap_or_else(|| "UnknownError".into()),
                message: self.exception_message.unwrap_or_default(),
            });
        }
        self.signed_xml.ok_or_else(|| Error::Signing {
            kind: INVALID_SIGNER_RESULT.into(),
            message: "signer reported success without a signed document".into(),
        })
    }
}

/// A signer together with the actions it is responsible for
#[derive(Clone)]
pub struct SignerRegistration {
    signer: Arc<dyn ExternalSigner>,
    actions: Vec<String>,
}

impl SignerRegistration {
    pub fn new<I, S>(signer: Arc<dyn ExternalSigner>, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            signer,
            actions: actions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn signer(&self) -> &Arc<dyn ExternalSigner> {
        &self.signer
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn matches(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }

    pub(crate) fn release(&mut self, actions: &[String]) {
        self.actions.retain(|a| !actions.contains(a));
    }
}

impl fmt::Debug for SignerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerRegistration")
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}
