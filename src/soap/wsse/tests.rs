use chrono::Utc;

use crate::soap::wsse::*;
use crate::xml::{Document, Element, Namespaces};

const SOAP11: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const SOAP12: &str = "http://www.w3.org/2003/05/soap-envelope";

fn namespaces() -> Namespaces {
    Namespaces::new()
        .with("soap", SOAP11)
        .with("wsse", ns::WSSE)
        .with("wsu", ns::WSU)
}

fn secure(xml: &str, user: Option<&UserCredentials>) -> Result<Document> {
    let mut document = Document::parse(xml)?;
    let now = Utc::now();
    {
        let mut security = SecurityHeader::locate_or_create(&mut document)?;
        security.set_timestamp(Timestamp::new(now, DEFAULT_TTL_SECONDS).to_element());
        if let Some(credentials) = user {
            security.set_username_token(UsernameToken::new(credentials, now)?.to_element());
        }
    }
    // serialized output must stand on its own
    Ok(Document::parse(document.to_xml()?)?)
}

#[test]
fn test_header_is_created_before_body() {
    let doc = secure(
        r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><m:Op xmlns:m="urn:m"/></soap:Body></soap:Envelope>"#,
        None,
    )
    .unwrap();

    let names: Vec<_> = doc.root().child_elements().map(Element::name).collect();
    assert_eq!(names, ["soap:Header", "soap:Body"]);

    let security = doc.query(&namespaces(), "//soap:Header/wsse:Security").unwrap();
    assert_eq!(security.len(), 1);
    assert_eq!(security[0].attribute("soap:mustUnderstand").as_deref(), Some("1"));
    assert_eq!(
        doc.query(&namespaces(), "//wsse:Security/wsu:Timestamp").unwrap().len(),
        1
    );
}

#[test]
fn test_existing_security_is_reused() {
    let xml = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:sec="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd">
  <soap:Header>
    <sec:Security>
      <sec:BinarySecurityToken>abc</sec:BinarySecurityToken>
      <u:Timestamp xmlns:u="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd"><u:Created>2000-01-01T00:00:00Z</u:Created></u:Timestamp>
    </sec:Security>
  </soap:Header>
  <soap:Body/>
</soap:Envelope>"#;
    let creds = UserCredentials::new("user", "password", false);
    let doc = secure(xml, Some(&creds)).unwrap();
    let ns = namespaces();

    assert_eq!(doc.query(&ns, "//wsse:Security").unwrap().len(), 1);
    assert_eq!(doc.query(&ns, "//wsse:BinarySecurityToken").unwrap().len(), 1);

    let timestamps = doc.query(&ns, "//wsse:Security/wsu:Timestamp").unwrap();
    assert_eq!(timestamps.len(), 1);
    assert_ne!(
        timestamps[0].find_child(ns::WSU, "Created").unwrap().text(),
        "2000-01-01T00:00:00Z"
    );
    assert_eq!(
        doc.query(&ns, "//wsse:Security/wsse:UsernameToken").unwrap().len(),
        1
    );
}

#[test]
fn test_username_token_precedes_timestamp() {
    let creds = UserCredentials::new("user", "password", true);
    let doc = secure(
        r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Header/><soap:Body/></soap:Envelope>"#,
        Some(&creds),
    )
    .unwrap();

    let security = doc.query(&namespaces(), "//wsse:Security").unwrap();
    let order: Vec<_> = security[0].child_elements().map(Element::local_name).collect();
    assert_eq!(order, ["UsernameToken", "Timestamp"]);
}

#[test]
fn test_soap12_default_namespace_envelope() {
    let doc = secure(
        r#"<Envelope xmlns="http://www.w3.org/2003/05/soap-envelope"><Body><GetUser xmlns="urn:u"/></Body></Envelope>"#,
        None,
    )
    .unwrap();
    let ns = Namespaces::new().with("env", SOAP12).with("wsse", ns::WSSE);

    let security = doc.query(&ns, "/env:Envelope/env:Header/wsse:Security").unwrap();
    assert_eq!(security.len(), 1);
    assert_eq!(
        security[0].attribute_ns(SOAP12, "mustUnderstand").as_deref(),
        Some("true")
    );
}

#[test]
fn test_conflicting_prefix_is_redeclared() {
    // `wsu` bound to something else on the envelope
    let doc = secure(
        r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:wsu="urn:other"><soap:Body/></soap:Envelope>"#,
        None,
    )
    .unwrap();
    let ts = doc.query(&namespaces(), "//wsse:Security/wsu:Timestamp").unwrap();
    assert_eq!(ts.len(), 1);
    assert!(ts[0].find_child(ns::WSU, "Expires").is_some());
}

#[test]
fn test_rejects_non_envelopes() {
    for xml in [
        "<foo/>",
        r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"/>"#,
        r#"<Envelope><Body/></Envelope>"#,
    ] {
        assert!(
            matches!(secure(xml, None), Err(Error::MalformedRequest(_))),
            "expected MalformedRequest for {xml}"
        );
    }
    assert!(matches!(secure("<a>", None), Err(Error::MalformedRequest(_))));
}
