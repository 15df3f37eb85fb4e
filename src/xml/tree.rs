use std::borrow::Cow;

use quick_xml::escape::{escape, unescape};

use crate::xml::{Result, XMLNS_NS, parser, writer};

/// The `<?xml ...?>` declaration of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

/// A parsed XML document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub(crate) declaration: Option<Declaration>,
    pub(crate) prolog: Vec<Node>,
    pub(crate) root: Element,
    pub(crate) epilog: Vec<Node>,
}

impl Document {
    /// Creates a document around the given root element
    pub fn new(root: Element) -> Self {
        Self {
            declaration: None,
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }

    /// Parses a document from raw bytes
    pub fn parse(bytes: impl AsRef<[u8]>) -> Result<Self> {
        parser::parse(bytes.as_ref())
    }

    pub fn declaration(&self) -> Option<&Declaration> {
        self.declaration.as_ref()
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Serializes the document back to bytes
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        writer::write(self)
    }

    /// Serializes the document to a string
    pub fn to_xml_string(&self) -> Result<String> {
        let bytes = self.to_xml()?;
        String::from_utf8(bytes).map_err(|e| crate::xml::Error::Write(e.to_string()))
    }
}

/// A node in the element tree.
///
/// Text, comment and doctype content is kept in its escaped form.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    DocType(String),
}

impl Node {
    /// Creates a text node, escaping the given content
    pub fn text(content: &str) -> Self {
        Node::Text(escape(content).into_owned())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// An attribute with its value kept escaped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub(crate) name: String,
    pub(crate) namespace: Option<String>,
    pub(crate) value: String,
}

impl Attribute {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn local_name(&self) -> &str {
        split_name(&self.name).1
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The unescaped value
    pub fn value(&self) -> Cow<'_, str> {
        unescape(&self.value).unwrap_or(Cow::Borrowed(self.value.as_str()))
    }

    /// The value as it appears in the document
    pub fn raw_value(&self) -> &str {
        &self.value
    }

    /// Whether this is an `xmlns` or `xmlns:*` declaration
    pub fn is_namespace_declaration(&self) -> bool {
        self.name == "xmlns" || self.name.starts_with("xmlns:")
    }
}

/// An element with its qualified name and resolved namespace
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub(crate) name: String,
    pub(crate) namespace: Option<String>,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) children: Vec<Node>,
}

impl Element {
    /// Creates an element named `prefix:local` (or `local`) in `namespace`.
    ///
    /// No namespace declaration is added; use [`Element::declare_namespace`]
    /// when the prefix is not already bound where the element is inserted.
    pub fn new(name: impl Into<String>, namespace: Option<&str>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.map(str::to_string),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> Option<&str> {
        split_name(&self.name).0
    }

    pub fn local_name(&self) -> &str {
        split_name(&self.name).1
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Whether the element has the given namespace and local name
    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.namespace() == Some(namespace) && self.local_name() == local_name
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Unescaped value of the attribute with the given qualified name
    pub fn attribute(&self, name: &str) -> Option<Cow<'_, str>> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(Attribute::value)
    }

    /// Unescaped value of the attribute with the given namespace and local name
    pub fn attribute_ns(&self, namespace: &str, local_name: &str) -> Option<Cow<'_, str>> {
        self.attributes
            .iter()
            .find(|attr| attr.namespace() == Some(namespace) && attr.local_name() == local_name)
            .map(Attribute::value)
    }

    /// Sets an unqualified attribute, replacing any previous value
    pub fn set_attribute(&mut self, name: &str, value: &str) -> &mut Self {
        self.put_attribute(name, None, value)
    }

    /// Sets a prefixed attribute in `namespace`, replacing any previous value
    pub fn set_attribute_ns(&mut self, name: &str, namespace: &str, value: &str) -> &mut Self {
        self.put_attribute(name, Some(namespace), value)
    }

    fn put_attribute(&mut self, name: &str, namespace: Option<&str>, value: &str) -> &mut Self {
        let value = escape(value).into_owned();
        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => {
                attr.namespace = namespace.map(str::to_string);
                attr.value = value;
            }
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                namespace: namespace.map(str::to_string),
                value,
            }),
        }
        self
    }

    /// Adds an `xmlns:prefix` (or default `xmlns` for an empty prefix) declaration
    pub fn declare_namespace(&mut self, prefix: &str, uri: &str) -> &mut Self {
        let name = if prefix.is_empty() {
            "xmlns".to_string()
        } else {
            format!("xmlns:{prefix}")
        };
        self.put_attribute(&name, Some(XMLNS_NS), uri)
    }

    /// The namespace this element itself declares for `prefix`
    pub fn declared_namespace(&self, prefix: &str) -> Option<Cow<'_, str>> {
        self.attributes
            .iter()
            .filter(|attr| attr.is_namespace_declaration())
            .find(|attr| match attr.name.strip_prefix("xmlns") {
                Some("") => prefix.is_empty(),
                Some(rest) => rest.strip_prefix(':') == Some(prefix),
                None => false,
            })
            .map(Attribute::value)
    }

    /// Concatenated, unescaped text and CDATA content of the direct children
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Node::Text(raw) => {
                    out.push_str(&unescape(raw).unwrap_or(Cow::Borrowed(raw.as_str())));
                }
                Node::CData(data) => out.push_str(data),
                _ => {}
            }
        }
        out
    }

    /// Replaces all children with a single text node
    pub fn set_text(&mut self, text: &str) -> &mut Self {
        self.children = vec![Node::text(text)];
        self
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(Node::as_element_mut)
    }

    /// First child element with the given namespace and local name
    pub fn find_child(&self, namespace: &str, local_name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.is(namespace, local_name))
    }

    pub fn find_child_mut(&mut self, namespace: &str, local_name: &str) -> Option<&mut Element> {
        self.child_elements_mut().find(|e| e.is(namespace, local_name))
    }

    /// Index in [`Element::children`] of the first matching child element
    pub fn position_of(&self, namespace: &str, local_name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|node| node.as_element().is_some_and(|e| e.is(namespace, local_name)))
    }

    pub fn append_child(&mut self, child: impl Into<Node>) -> &mut Self {
        self.children.push(child.into());
        self
    }

    /// Inserts `child` before the child at `reference`; past the end it appends
    pub fn insert_before(&mut self, reference: usize, child: impl Into<Node>) -> &mut Self {
        let index = reference.min(self.children.len());
        self.children.insert(index, child.into());
        self
    }

    /// Removes child elements matching the predicate, returns how many were removed
    pub fn remove_children<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Element) -> bool,
    {
        let before = self.children.len();
        self.children
            .retain(|node| !node.as_element().is_some_and(&mut predicate));
        before - self.children.len()
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_attribute_ns(mut self, name: &str, namespace: &str, value: &str) -> Self {
        self.set_attribute_ns(name, namespace, value);
        self
    }

    pub fn with_namespace(mut self, prefix: &str, uri: &str) -> Self {
        self.declare_namespace(prefix, uri);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.append_child(child);
        self
    }
}

fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}
