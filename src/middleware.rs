//! Request middleware chain.
//!
//! A [`Client`] runs each request through its middlewares in insertion order
//! and finally hands it to a [`Transport`]. Every middleware receives a
//! [`Next`] continuation and decides whether, and with which request, the
//! chain continues.

mod error;
mod transport;
mod wsse;

pub use error::Error;
pub use transport::HttpTransport;
pub use wsse::{MiddlewareConfig, WsseMiddleware};

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

pub type Request = http::Request<Bytes>;
pub type Response = http::Response<Bytes>;
pub type Result<T> = std::result::Result<T, Error>;

#[async_trait]
pub trait Middleware: Send + Sync {
    /// Stable identifier of the middleware
    fn name(&self) -> &str;

    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response>;
}

/// Terminal stage of a chain, actually sending the request
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response>;
}

/// The remainder of a chain
#[derive(Clone, Copy)]
pub struct Next<'a> {
    middlewares: &'a [Arc<dyn Middleware>],
    transport: &'a dyn Transport,
}

impl<'a> Next<'a> {
    pub fn new(middlewares: &'a [Arc<dyn Middleware>], transport: &'a dyn Transport) -> Self {
        Self {
            middlewares,
            transport,
        }
    }

    /// Pass `request` on to the next middleware, or to the transport at the end
    pub async fn run(self, request: Request) -> Result<Response> {
        match self.middlewares.split_first() {
            Some((current, rest)) => current.handle(request, Next::new(rest, self.transport)).await,
            None => self.transport.send(request).await,
        }
    }
}

#[derive(Clone)]
pub struct Client {
    middlewares: Vec<Arc<dyn Middleware>>,
    transport: Arc<dyn Transport>,
}

impl Client {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_transport(Arc::new(transport))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            middlewares: Vec::new(),
            transport,
        }
    }

    /// Append a middleware to the chain
    pub fn with(self, middleware: impl Middleware + 'static) -> Self {
        self.with_arc(Arc::new(middleware))
    }

    /// Append a shared middleware, keeping a handle for later reconfiguration
    pub fn with_arc(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    pub fn middleware_names(&self) -> Vec<&str> {
        self.middlewares.iter().map(|m| m.name()).collect()
    }

    pub async fn send(&self, request: Request) -> Result<Response> {
        Next::new(&self.middlewares, self.transport.as_ref())
            .run(request)
            .await
    }
}
