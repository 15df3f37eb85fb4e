use std::borrow::Cow;

use crate::soap::wsse::{Error, Result, ns, prefix};
use crate::soap::{self, SoapVersion};
use crate::xml::{Document, Element};

/// Mutable handle on the `wsse:Security` header block of an envelope
#[derive(Debug)]
pub struct SecurityHeader<'a> {
    security: &'a mut Element,
    // bindings that are shadowed in scope and must be redeclared on inserted tokens
    redeclare: Vec<(&'static str, &'static str)>,
}

impl<'a> SecurityHeader<'a> {
    /// Find the `Security` block of `document`, creating the SOAP `Header`
    /// and the `Security` element when they are missing.
    ///
    /// An existing `Security` block is reused so the envelope never carries
    /// two of them.
    pub fn locate_or_create(document: &'a mut Document) -> Result<Self> {
        let envelope = document.root_mut();
        let version = SoapVersion::of_envelope(envelope).ok_or_else(|| {
            Error::MalformedRequest(format!(
                "root element <{}> is not a SOAP envelope",
                envelope.name()
            ))
        })?;
        let env_ns = version.namespace();
        let body_index = envelope
            .position_of(env_ns, "Body")
            .ok_or_else(|| Error::MalformedRequest("SOAP envelope has no Body".into()))?;
        let env_prefix = envelope.prefix().map(str::to_string);

        let mut inherited = [prefix::WSSE, prefix::WSU].map(|p| owned(envelope.declared_namespace(p)));

        if envelope.find_child(env_ns, "Header").is_none() {
            let header = Element::new(qualified(env_prefix.as_deref(), "Header"), Some(env_ns));
            envelope.insert_before(body_index, header);
        }
        let header = envelope
            .find_child_mut(env_ns, "Header")
            .ok_or_else(|| Error::HeaderConstruction("SOAP Header could not be created".into()))?;

        for (slot, p) in inherited.iter_mut().zip([prefix::WSSE, prefix::WSU]) {
            if let Some(uri) = owned(header.declared_namespace(p)) {
                *slot = Some(uri);
            }
        }

        if header.find_child(ns::WSSE, "Security").is_none() {
            header.append_child(new_security(version, env_prefix.as_deref()));
        }
        let security = header
            .find_child_mut(ns::WSSE, "Security")
            .ok_or_else(|| Error::HeaderConstruction("Security header could not be created".into()))?;

        let mut redeclare = Vec::new();
        for (slot, (p, uri)) in inherited
            .into_iter()
            .zip([(prefix::WSSE, ns::WSSE), (prefix::WSU, ns::WSU)])
        {
            match owned(security.declared_namespace(p)).or(slot) {
                None => {
                    security.declare_namespace(p, uri);
                }
                Some(bound) if bound == uri => {}
                Some(_) => redeclare.push((p, uri)),
            }
        }

        Ok(Self { security, redeclare })
    }

    /// Replace any existing `wsu:Timestamp` with `timestamp`
    pub fn set_timestamp(&mut self, timestamp: Element) {
        self.security.remove_children(|e| e.is(ns::WSU, "Timestamp"));
        let timestamp = self.bind(timestamp);
        self.security.append_child(timestamp);
    }

    /// Replace any existing `wsse:UsernameToken`; it goes before the timestamp
    pub fn set_username_token(&mut self, token: Element) {
        self.security.remove_children(|e| e.is(ns::WSSE, "UsernameToken"));
        let token = self.bind(token);
        match self.security.position_of(ns::WSU, "Timestamp") {
            Some(index) => self.security.insert_before(index, token),
            None => self.security.append_child(token),
        };
    }

    pub fn element(&self) -> &Element {
        &*self.security
    }

    fn bind(&self, mut element: Element) -> Element {
        for (p, uri) in &self.redeclare {
            element.declare_namespace(p, uri);
        }
        element
    }
}

fn new_security(version: SoapVersion, env_prefix: Option<&str>) -> Element {
    let must_understand = match version {
        SoapVersion::Soap11 => "1",
        SoapVersion::Soap12 => "true",
    };
    let mut security = Element::new(format!("{}:Security", prefix::WSSE), Some(ns::WSSE))
        .with_namespace(prefix::WSSE, ns::WSSE);

    // an unprefixed envelope needs a local prefix for the attribute
    let env_prefix = match env_prefix {
        Some(p) => p,
        None => {
            security.declare_namespace(soap::prefix::SOAP_ENV, version.namespace());
            soap::prefix::SOAP_ENV
        }
    };
    security.set_attribute_ns(
        &format!("{env_prefix}:mustUnderstand"),
        version.namespace(),
        must_understand,
    );
    security
}

fn qualified(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(p) => format!("{p}:{local}"),
        None => local.to_string(),
    }
}

fn owned(value: Option<Cow<'_, str>>) -> Option<String> {
    value.map(Cow::into_owned)
}
