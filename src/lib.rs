//! WS-Security header injection for outgoing SOAP requests.
//!
//! The [`middleware::WsseMiddleware`] sits in a [`middleware::Client`] chain,
//! adds a `wsse:Security` header (timestamp, optional username token) to each
//! outgoing envelope and hands the result to a registered
//! [`soap::wsse::ExternalSigner`] when the request's SOAP action matches.

pub mod config;
pub mod crypto;
pub mod middleware;
pub mod soap;
pub mod telemetry;
pub mod xml;
