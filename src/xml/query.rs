use std::collections::{BTreeMap, HashMap};

use crate::xml::{Document, Element, Error, Result};

/// Prefix to namespace URI bindings used to resolve path expressions.
///
/// The bindings are independent of the prefixes a document happens to use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespaces {
    bindings: BTreeMap<String, String>,
}

impl Namespaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a binding, builder style
    pub fn with(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.register(prefix, uri);
        self
    }

    /// Adds or replaces a binding
    pub fn register(&mut self, prefix: impl Into<String>, uri: impl Into<String>) -> &mut Self {
        self.bindings.insert(prefix.into(), uri.into());
        self
    }

    /// Resolves a registered prefix
    pub fn resolve(&self, prefix: &str) -> Result<&str> {
        self.bindings
            .get(prefix)
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownNamespace(prefix.to_string()))
    }
}

/// A document paired with the namespace bindings its queries use
#[derive(Debug, Clone)]
pub struct XmlView<'a> {
    document: &'a Document,
    namespaces: Namespaces,
}

impl<'a> XmlView<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            namespaces: Namespaces::new(),
        }
    }

    pub fn with_namespaces(document: &'a Document, namespaces: Namespaces) -> Self {
        Self {
            document,
            namespaces,
        }
    }

    pub fn register_namespace(&mut self, prefix: &str, uri: &str) -> &mut Self {
        self.namespaces.register(prefix, uri);
        self
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }

    /// Elements matching `path`, in document order
    pub fn query(&self, path: &str) -> Result<Vec<&'a Element>> {
        self.document.query(&self.namespaces, path)
    }
}

impl Document {
    /// Evaluates a path expression against this document.
    ///
    /// Supported syntax: `/` child steps, `//` descendant steps, `prefix:name`,
    /// `prefix:*`, `*` and unprefixed names (which match elements without a
    /// namespace). A path without a leading slash starts at the document.
    pub fn query<'a>(&'a self, namespaces: &Namespaces, path: &str) -> Result<Vec<&'a Element>> {
        let steps = compile(path, namespaces)?;
        let order = document_order(&self.root);

        let mut context: Vec<&'a Element> = Vec::new();
        for (index, step) in steps.iter().enumerate() {
            let mut candidates = Vec::new();
            if index == 0 {
                candidates.push(&self.root);
                if step.axis == Axis::Descendant {
                    collect_descendants(&self.root, &mut candidates);
                }
            } else {
                for &element in &context {
                    match step.axis {
                        Axis::Child => candidates.extend(element.child_elements()),
                        Axis::Descendant => collect_descendants(element, &mut candidates),
                    }
                }
            }

            let mut matched: Vec<(usize, &'a Element)> = candidates
                .into_iter()
                .filter(|element| step.test.matches(element))
                .filter_map(|element| Some((*order.get(&(element as *const Element))?, element)))
                .collect();
            matched.sort_unstable_by_key(|(position, _)| *position);
            matched.dedup_by_key(|(position, _)| *position);
            context = matched.into_iter().map(|(_, element)| element).collect();
        }
        Ok(context)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug)]
enum NameTest {
    Any,
    AnyIn(String),
    Name {
        namespace: Option<String>,
        local_name: String,
    },
}

impl NameTest {
    fn matches(&self, element: &Element) -> bool {
        match self {
            NameTest::Any => true,
            NameTest::AnyIn(namespace) => element.namespace() == Some(namespace.as_str()),
            NameTest::Name {
                namespace,
                local_name,
            } => element.namespace() == namespace.as_deref() && element.local_name() == local_name,
        }
    }
}

#[derive(Debug)]
struct Step {
    axis: Axis,
    test: NameTest,
}

fn compile(path: &str, namespaces: &Namespaces) -> Result<Vec<Step>> {
    let invalid = |reason: &str| Error::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let mut rest = path.trim();
    if rest.is_empty() {
        return Err(invalid("empty expression"));
    }

    let mut axis = if let Some(r) = rest.strip_prefix("//") {
        rest = r;
        Axis::Descendant
    } else if let Some(r) = rest.strip_prefix('/') {
        rest = r;
        Axis::Child
    } else {
        Axis::Child
    };

    let mut steps = Vec::new();
    loop {
        let (segment, remainder) = match rest.find('/') {
            Some(i) => (&rest[..i], Some(&rest[i..])),
            None => (rest, None),
        };
        if segment.is_empty() {
            return Err(invalid("empty step"));
        }
        steps.push(Step {
            axis,
            test: compile_name_test(segment, namespaces)?,
        });

        match remainder {
            None => break,
            Some(r) => {
                if let Some(r) = r.strip_prefix("//") {
                    axis = Axis::Descendant;
                    rest = r;
                } else {
                    axis = Axis::Child;
                    rest = &r[1..];
                }
            }
        }
    }
    Ok(steps)
}

fn compile_name_test(segment: &str, namespaces: &Namespaces) -> Result<NameTest> {
    if segment == "*" {
        return Ok(NameTest::Any);
    }
    match segment.split_once(':') {
        Some((prefix, "*")) => Ok(NameTest::AnyIn(namespaces.resolve(prefix)?.to_string())),
        Some((prefix, local_name)) => Ok(NameTest::Name {
            namespace: Some(namespaces.resolve(prefix)?.to_string()),
            local_name: local_name.to_string(),
        }),
        None => Ok(NameTest::Name {
            namespace: None,
            local_name: segment.to_string(),
        }),
    }
}

/// Pre-order position of every element, keyed by address
fn document_order(root: &Element) -> HashMap<*const Element, usize> {
    let mut elements = vec![root];
    collect_descendants(root, &mut elements);
    elements
        .into_iter()
        .enumerate()
        .map(|(position, element)| (element as *const Element, position))
        .collect()
}

fn collect_descendants<'a>(element: &'a Element, out: &mut Vec<&'a Element>) {
    for child in element.child_elements() {
        out.push(child);
        collect_descendants(child, out);
    }
}
