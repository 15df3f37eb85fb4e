use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesDecl, BytesStart, Event};

use crate::xml::{
    Attribute, Declaration, Document, Element, Error, Node, Result, XML_NS, XMLNS_NS,
};

/// Namespace declarations in scope, one frame per open element
#[derive(Default)]
struct Scopes {
    frames: Vec<Vec<(String, String)>>,
}

impl Scopes {
    fn push(&mut self, declarations: Vec<(String, String)>) {
        self.frames.push(declarations);
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    /// Resolves a prefix (empty for the default namespace) to its URI
    fn resolve(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NS);
        }
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter())
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
            .filter(|uri| !uri.is_empty())
    }
}

#[derive(Default)]
struct Builder {
    declaration: Option<Declaration>,
    prolog: Vec<Node>,
    root: Option<Element>,
    epilog: Vec<Node>,
    open: Vec<Element>,
}

impl Builder {
    /// Nothing but whitespace has been read so far
    fn is_pristine(&self) -> bool {
        self.root.is_none()
            && self.open.is_empty()
            && self
                .prolog
                .iter()
                .all(|node| matches!(node, Node::Text(text) if is_whitespace(text)))
    }

    /// Attaches a node to the innermost open element or to the document level
    fn attach(&mut self, node: Node) -> Result<()> {
        if let Some(parent) = self.open.last_mut() {
            parent.children.push(node);
            return Ok(());
        }
        match node {
            Node::Element(element) => {
                if self.root.is_some() {
                    return Err(Error::Parse("document has more than one root element".into()));
                }
                self.root = Some(element);
            }
            Node::Text(ref text) | Node::CData(ref text) if !is_whitespace(text) => {
                return Err(Error::Parse("content outside of the root element".into()));
            }
            Node::CData(_) => {
                return Err(Error::Parse("CDATA outside of the root element".into()));
            }
            Node::DocType(_) if self.root.is_some() => {
                return Err(Error::Parse("DOCTYPE after the root element".into()));
            }
            node if self.root.is_some() => self.epilog.push(node),
            node => self.prolog.push(node),
        }
        Ok(())
    }
}

pub(crate) fn parse(bytes: &[u8]) -> Result<Document> {
    let xml = std::str::from_utf8(bytes)?;
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut scopes = Scopes::default();
    let mut builder = Builder::default();

    loop {
        let event = reader.read_event().map_err(|e| {
            Error::Parse(format!("at position {}: {e}", reader.error_position()))
        })?;
        match event {
            Event::Decl(decl) => {
                if builder.declaration.is_some() || !builder.is_pristine() {
                    return Err(Error::Parse("misplaced XML declaration".into()));
                }
                builder.declaration = Some(read_declaration(&decl)?);
            }
            Event::Start(start) => {
                let element = open_element(&start, &mut scopes)?;
                builder.open.push(element);
            }
            Event::Empty(start) => {
                let element = open_element(&start, &mut scopes)?;
                scopes.pop();
                builder.attach(Node::Element(element))?;
            }
            Event::End(_) => {
                let element = builder
                    .open
                    .pop()
                    .ok_or_else(|| Error::Parse("unexpected closing tag".into()))?;
                scopes.pop();
                builder.attach(Node::Element(element))?;
            }
            Event::Text(text) => {
                let raw = std::str::from_utf8(&text)?;
                check_escaped(raw)?;
                builder.attach(Node::Text(raw.to_string()))?;
            }
            Event::CData(data) => {
                let data = std::str::from_utf8(&data)?;
                builder.attach(Node::CData(data.to_string()))?;
            }
            Event::Comment(comment) => {
                let comment = std::str::from_utf8(&comment)?;
                builder.attach(Node::Comment(comment.to_string()))?;
            }
            Event::PI(pi) => {
                let content = std::str::from_utf8(&pi)?;
                builder.attach(Node::ProcessingInstruction(content.to_string()))?;
            }
            Event::DocType(doctype) => {
                let content = std::str::from_utf8(&doctype)?;
                builder.attach(Node::DocType(content.to_string()))?;
            }
            Event::Eof => break,
        }
    }

    if let Some(unclosed) = builder.open.last() {
        return Err(Error::Parse(format!("unclosed element <{}>", unclosed.name())));
    }
    let root = builder
        .root
        .ok_or_else(|| Error::Parse("document has no root element".into()))?;

    Ok(Document {
        declaration: builder.declaration,
        prolog: builder.prolog,
        root,
        epilog: builder.epilog,
    })
}

fn read_declaration(decl: &BytesDecl<'_>) -> Result<Declaration> {
    let version = decl.version()?;
    let encoding = decl.encoding().transpose()?;
    let standalone = decl.standalone().transpose()?;
    Ok(Declaration {
        version: std::str::from_utf8(&version)?.to_string(),
        encoding: encoding
            .map(|e| std::str::from_utf8(&e).map(str::to_string))
            .transpose()?,
        standalone: standalone
            .map(|s| std::str::from_utf8(&s).map(str::to_string))
            .transpose()?,
    })
}

/// Builds an element from a start tag and pushes its namespace scope
fn open_element(start: &BytesStart<'_>, scopes: &mut Scopes) -> Result<Element> {
    let name = std::str::from_utf8(start.name().as_ref())?.to_string();

    let mut declarations = Vec::new();
    let mut raw_attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let value = std::str::from_utf8(&attr.value)?.to_string();
        check_escaped(&value)?;
        if key == "xmlns" {
            declarations.push((String::new(), unescape(&value)?.into_owned()));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            declarations.push((prefix.to_string(), unescape(&value)?.into_owned()));
        }
        raw_attributes.push((key, value));
    }
    scopes.push(declarations);

    let namespace = match name.split_once(':') {
        Some((prefix, _)) => Some(resolve_prefix(scopes, prefix, &name)?),
        None => scopes.resolve("").map(str::to_string),
    };

    let mut attributes = Vec::with_capacity(raw_attributes.len());
    for (key, value) in raw_attributes {
        let namespace = if key == "xmlns" || key.starts_with("xmlns:") {
            Some(XMLNS_NS.to_string())
        } else if let Some((prefix, _)) = key.split_once(':') {
            Some(resolve_prefix(scopes, prefix, &name)?)
        } else {
            None
        };
        attributes.push(Attribute {
            name: key,
            namespace,
            value,
        });
    }

    Ok(Element {
        name,
        namespace,
        attributes,
        children: Vec::new(),
    })
}

fn resolve_prefix(scopes: &Scopes, prefix: &str, element: &str) -> Result<String> {
    scopes
        .resolve(prefix)
        .map(str::to_string)
        .ok_or_else(|| Error::Parse(format!("unbound namespace prefix '{prefix}' on <{element}>")))
}

fn check_escaped(raw: &str) -> Result<()> {
    unescape(raw)?;
    Ok(())
}

fn is_whitespace(raw: &str) -> bool {
    raw.chars().all(char::is_whitespace)
}
