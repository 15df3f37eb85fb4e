#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode, Uri};
use soap_wsse::middleware::{self, Request, Response, Transport};
use soap_wsse::soap::wsse::{ExternalSigner, SignerResult, ns};
use soap_wsse::xml::{Document, Namespaces};
use tokio::net::TcpListener;

pub const BASIC_PZ_REQUEST: &str = include_str!("../fixtures/basic-pz-request.xml");
pub const BASIC_PZ_SIGNED: &str = include_str!("../fixtures/basic-pz-signed-response.xml");
pub const EMPTY_REQUEST: &str = include_str!("../fixtures/empty-request.xml");

pub const SOAP11_ENV: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// A request as seen by the transport
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap()
    }
}

/// Transport recording every request it is handed
#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<Recorded>>,
    status: Option<StatusCode>,
    body: Bytes,
}

impl RecordingTransport {
    pub fn responding(status: StatusCode, body: &'static str) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            status: Some(status),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Body of the first forwarded request
    pub fn first_body(&self) -> String {
        self.requests()[0].body_str().to_string()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: Request) -> middleware::Result<Response> {
        let (parts, body) = request.into_parts();
        self.requests.lock().unwrap().push(Recorded {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
        });
        let mut response = Response::new(self.body.clone());
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        Ok(response)
    }
}

/// Signer answering every call with a fixed result and recording its input
pub struct MockSigner {
    result: SignerResult,
    calls: AtomicUsize,
    inputs: Mutex<Vec<String>>,
}

impl MockSigner {
    pub fn returning(result: SignerResult) -> Arc<Self> {
        Arc::new(Self {
            result,
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn signed_fixture() -> Arc<Self> {
        Self::returning(SignerResult::signed(BASIC_PZ_SIGNED))
    }

    pub fn failing() -> Arc<Self> {
        Self::returning(SignerResult::failure(
            "TestException",
            "Signer failed for testing purposes",
        ))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExternalSigner for MockSigner {
    async fn sign_xml(&self, xml: &str) -> SignerResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(xml.to_string());
        self.result.clone()
    }
}

pub fn soap_request(body: &str, action: &str) -> Request {
    http::Request::builder()
        .method(Method::POST)
        .uri("/")
        .header("SOAPAction", action)
        .body(Bytes::copy_from_slice(body.as_bytes()))
        .unwrap()
}

/// Prefixes used by the assertions, independent of the document's own
pub fn namespaces() -> Namespaces {
    Namespaces::new()
        .with("soap", SOAP11_ENV)
        .with("wsse", ns::WSSE)
        .with("wsu", ns::WSU)
        .with("ds", ns::DS)
}

pub fn count(doc: &Document, path: &str) -> usize {
    doc.query(&namespaces(), path).unwrap().len()
}

pub fn text(doc: &Document, path: &str) -> String {
    doc.query(&namespaces(), path).unwrap()[0].text()
}

// Helper function to spawn a test server on a random port
pub async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("failed to run server");
    });
    format!("http://{addr}")
}
