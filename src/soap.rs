pub mod wsse;

use http::header::{CONTENT_TYPE, HeaderName};
use http::HeaderMap;

use crate::xml::Element;

pub mod ns {
    pub const SOAP11_ENV: &str = "http://schemas.xmlsoap.org/soap/envelope/";
    pub const SOAP12_ENV: &str = "http://www.w3.org/2003/05/soap-envelope";
}

pub mod prefix {
    pub const SOAP_ENV: &str = "soapenv";
}

/// Transport header carrying the SOAP 1.1 action (`SOAPAction`)
pub const SOAP_ACTION_HEADER: HeaderName = HeaderName::from_static("soapaction");

/// SOAP protocol version, identified by the envelope namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapVersion {
    Soap11,
    Soap12,
}

impl SoapVersion {
    pub fn from_namespace(uri: &str) -> Option<Self> {
        match uri {
            ns::SOAP11_ENV => Some(Self::Soap11),
            ns::SOAP12_ENV => Some(Self::Soap12),
            _ => None,
        }
    }

    pub fn namespace(self) -> &'static str {
        match self {
            Self::Soap11 => ns::SOAP11_ENV,
            Self::Soap12 => ns::SOAP12_ENV,
        }
    }

    /// Version of the envelope rooted at `root`, if it is a SOAP envelope
    pub fn of_envelope(root: &Element) -> Option<Self> {
        if root.local_name() != "Envelope" {
            return None;
        }
        root.namespace().and_then(Self::from_namespace)
    }
}

/// Normalizes a SOAPAction header value (surrounding whitespace and quotes)
pub fn parse_soap_action(header_value: &str) -> String {
    header_value.trim().trim_matches('"').to_string()
}

/// The action of a request: the `SOAPAction` header, or for SOAP 1.2 the
/// `action` parameter of the `Content-Type` header
pub fn soap_action(headers: &HeaderMap) -> Option<String> {
    if let Some(action) = headers
        .get(&SOAP_ACTION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(parse_soap_action)
        .filter(|action| !action.is_empty())
    {
        return Some(action);
    }

    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("action"))
        .map(|(_, value)| parse_soap_action(value))
        .filter(|action| !action.is_empty())
}

/// Local name of the first element inside the envelope's `Body`, i.e. the operation
pub fn body_operation(root: &Element) -> Option<&str> {
    let version = SoapVersion::of_envelope(root)?;
    root.find_child(version.namespace(), "Body")?
        .child_elements()
        .next()
        .map(Element::local_name)
}
