//! Namespace-aware XML document model
//!
//! Parsing and serialization are built on `quick-xml`. Text and attribute
//! values keep their escaped form, so content this crate does not touch is
//! written back the way it was read.

mod error;
mod parser;
mod query;
mod tree;
mod writer;

pub use error::Error;
pub use query::{Namespaces, XmlView};
pub use tree::{Attribute, Declaration, Document, Element, Node};

pub type Result<T> = std::result::Result<T, Error>;

/// Namespace permanently bound to the `xml` prefix
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Namespace of `xmlns` declarations
pub const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";
