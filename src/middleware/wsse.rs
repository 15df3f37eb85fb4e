use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use http::HeaderValue;
use http::header::CONTENT_LENGTH;
use secrecy::SecretString;
use tracing::{Span, debug, info, instrument, warn};

use crate::config::WsseSettings;
use crate::middleware::{Middleware, Next, Request, Response, Result};
use crate::soap::wsse::{
    self, DEFAULT_TTL_SECONDS, Error, ExternalSigner, SecurityHeader, SignerRegistration,
    Timestamp, UserCredentials, UsernameToken,
};
use crate::soap::{body_operation, soap_action};
use crate::xml::Document;

/// Settings a [`WsseMiddleware`] applies to each request
#[derive(Debug, Clone)]
pub struct MiddlewareConfig {
    pub timestamp_ttl: u32,
    pub user_token: Option<UserCredentials>,
    pub signers: Vec<SignerRegistration>,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            timestamp_ttl: DEFAULT_TTL_SECONDS,
            user_token: None,
            signers: Vec::new(),
        }
    }
}

impl MiddlewareConfig {
    /// First registration, in insertion order, claiming any of `identifiers`
    pub fn select_signer(&self, identifiers: &[&str]) -> Option<&SignerRegistration> {
        self.signers
            .iter()
            .find(|registration| identifiers.iter().any(|id| registration.matches(id)))
    }

    fn register_signer(&mut self, registration: SignerRegistration) {
        for existing in &mut self.signers {
            existing.release(registration.actions());
        }
        self.signers.retain(|r| !r.actions().is_empty());
        self.signers.push(registration);
    }
}

/// Adds a `wsse:Security` header to outgoing SOAP requests and, for
/// registered actions, has the envelope signed by an [`ExternalSigner`].
///
/// Configuration can change while requests are in flight; each request works
/// on the snapshot taken when it entered the middleware.
#[derive(Debug, Default)]
pub struct WsseMiddleware {
    config: RwLock<Arc<MiddlewareConfig>>,
}

impl WsseMiddleware {
    pub const NAME: &'static str = "wsse_with_external_signer_middleware";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &WsseSettings) -> wsse::Result<Self> {
        let middleware = Self::new();
        middleware.with_timestamp(settings.timestamp_ttl)?;

        match (&settings.username, &settings.password) {
            (Some(username), Some(password)) => {
                middleware.with_user_token(
                    username.clone(),
                    password.clone(),
                    settings.password_digest,
                );
            }
            (Some(_), None) => {
                return Err(Error::Config(
                    "wsse.password is required when wsse.username is set".into(),
                ));
            }
            (None, _) => {}
        }
        Ok(middleware)
    }

    /// Set the lifetime of generated timestamps
    pub fn with_timestamp(&self, ttl_seconds: u32) -> wsse::Result<&Self> {
        if ttl_seconds == 0 {
            return Err(Error::Config("timestamp TTL must be positive".into()));
        }
        self.update(|config| config.timestamp_ttl = ttl_seconds);
        Ok(self)
    }

    /// Add a `wsse:UsernameToken` to every request, replacing earlier settings
    pub fn with_user_token(
        &self,
        username: impl Into<String>,
        password: impl Into<SecretString>,
        use_digest: bool,
    ) -> &Self {
        let credentials = UserCredentials::new(username, password, use_digest);
        self.update(|config| config.user_token = Some(credentials));
        self
    }

    /// Have requests for `actions` signed by `signer`.
    ///
    /// Actions already claimed by an earlier registration move to this one.
    pub fn with_external_signer<I, S>(&self, signer: Arc<dyn ExternalSigner>, actions: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registration = SignerRegistration::new(signer, actions);
        self.update(|config| config.register_signer(registration));
        self
    }

    /// Current configuration snapshot
    pub fn config(&self) -> Arc<MiddlewareConfig> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, apply: impl FnOnce(&mut MiddlewareConfig)) {
        let mut guard = self.config.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = MiddlewareConfig::clone(&guard);
        apply(&mut next);
        *guard = Arc::new(next);
    }

    /// Add the security header to `request` and sign it when its action is
    /// registered. The returned request keeps method, URI and headers.
    pub async fn secure(&self, request: Request) -> wsse::Result<Request> {
        let config = self.config();
        let (mut parts, body) = request.into_parts();

        let mut document = Document::parse(&body)?;
        let now = Utc::now();
        let timestamp = Timestamp::new(now, config.timestamp_ttl);
        let user_token = config
            .user_token
            .as_ref()
            .map(|credentials| UsernameToken::new(credentials, now))
            .transpose()?;

        {
            let mut security = SecurityHeader::locate_or_create(&mut document)?;
            security.set_timestamp(timestamp.to_element());
            if let Some(token) = &user_token {
                security.set_username_token(token.to_element());
            }
        }
        debug!(
            state = "HeaderBuilt",
            timestamp = %timestamp.id,
            user_token = user_token.is_some()
        );

        let action = soap_action(&parts.headers);
        let operation = body_operation(document.root()).map(str::to_string);
        let identifiers: Vec<&str> = action
            .iter()
            .chain(operation.iter())
            .map(String::as_str)
            .collect();

        let body = match config.select_signer(&identifiers) {
            Some(registration) => {
                let xml = document.to_xml_string()?;
                drop(document);
                info!(actions = ?registration.actions(), "Signing request with external signer");
                let signed = registration
                    .signer()
                    .sign_xml(&xml)
                    .await
                    .into_result()
                    .inspect_err(|e| warn!("External signer failed: {e}"))?;
                debug!(state = "Signed", bytes = signed.len());
                Bytes::from(signed)
            }
            None => {
                let xml = document.to_xml()?;
                debug!(state = "Unsigned", ?identifiers, "No signer registered for request");
                Bytes::from(xml)
            }
        };

        if parts.headers.contains_key(CONTENT_LENGTH) {
            parts
                .headers
                .insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
        }
        debug!(state = "Rewritten", bytes = body.len());
        Ok(Request::from_parts(parts, body))
    }
}

#[async_trait]
impl Middleware for WsseMiddleware {
    fn name(&self) -> &str {
        Self::NAME
    }

    #[instrument(
        skip_all,
        fields(
            method = %request.method(),
            uri = %request.uri(),
            soap_action = tracing::field::Empty,
        )
    )]
    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response> {
        if let Some(action) = soap_action(request.headers()) {
            Span::current().record("soap_action", action.as_str());
        }
        debug!(state = "Received", bytes = request.body().len());

        let request = self
            .secure(request)
            .await
            .inspect_err(|e| warn!(state = "Failed", "Request not forwarded: {e}"))?;

        debug!(state = "Forwarded");
        next.run(request).await
    }
}
