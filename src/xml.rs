//! Owned, mutable XML tree.
//!
//! `roxmltree` gives a read-only view, so parts that get edited are copied into
//! [`Element`] trees that keep prefixes and namespace declarations as written,
//! and serialized back when the package is saved.

use crate::error::Error;

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QName {
    pub prefix: Option<String>,
    pub namespace: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(prefix: Option<&str>, namespace: Option<&str>, local: &str) -> Self {
        Self {
            prefix: prefix.map(String::from),
            namespace: namespace.map(String::from),
            local: local.to_string(),
        }
    }

    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == Some(namespace)
    }

    fn write(&self, out: &mut String) {
        if let Some(prefix) = &self.prefix {
            out.push_str(prefix);
            out.push(':');
        }
        out.push_str(&self.local);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    ProcessingInstruction { target: String, value: Option<String> },
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub name: QName,
    /// Namespace declarations made on this element: (prefix, uri), `None` = default.
    pub namespaces: Vec<(Option<String>, String)>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            namespaces: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.name.is(namespace, local)
    }

    pub fn attribute(&self, namespace: Option<&str>, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.local == local && a.name.namespace.as_deref() == namespace)
            .map(|a| a.value.as_str())
    }

    pub fn set_attribute(&mut self, name: QName, value: impl Into<String>) {
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name.local == name.local && a.name.namespace == name.namespace)
        {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(Node::as_element_mut)
    }

    /// Child elements with their raw index into `children`.
    pub fn indexed_elements(&self) -> impl Iterator<Item = (usize, &Element)> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_element().map(|e| (i, e)))
    }

    pub fn child(&self, namespace: &str, local: &str) -> Option<&Element> {
        self.elements().find(|e| e.is(namespace, local))
    }

    /// Depth-first, document order, including `self`.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(el) = stack.pop() {
            out.push(el);
            for child in el.elements().collect::<Vec<_>>().into_iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Follows raw child indices from `self`; `None` if any step is not an element.
    pub fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut current = self;
        for &idx in path {
            current = current.children.get_mut(idx)?.as_element_mut()?;
        }
        Some(current)
    }
}

/// Parse a whole part (e.g. `word/document.xml`) into an owned tree.
pub fn parse(xml: &str) -> Result<Element, Error> {
    let doc = roxmltree::Document::parse(xml)?;
    Ok(convert_element(doc.root_element(), &[]))
}

/// Parse a generated fragment. `namespaces` are treated as already in scope at the
/// insertion point, so they are not re-declared on the returned element.
pub fn parse_fragment(fragment: &str, namespaces: &[(&str, &str)]) -> Result<Element, Error> {
    let mut wrapped = String::from("<fragment");
    for (prefix, uri) in namespaces {
        wrapped.push_str(&format!(" xmlns:{}=\"{}\"", prefix, uri));
    }
    wrapped.push('>');
    wrapped.push_str(fragment);
    wrapped.push_str("</fragment>");

    let doc = roxmltree::Document::parse(&wrapped)?;
    let wrapper = doc.root_element();
    let in_scope = scope_of(wrapper);
    let first = wrapper
        .children()
        .find(|n| n.is_element())
        .ok_or_else(|| Error::Xml("empty fragment".into()))?;
    Ok(convert_element(first, &in_scope))
}

fn scope_of(node: roxmltree::Node) -> Vec<(Option<String>, String)> {
    node.namespaces()
        .map(|ns| (ns.name().map(String::from), ns.uri().to_string()))
        .filter(|(prefix, _)| prefix.as_deref() != Some("xml"))
        .collect()
}

fn attribute_prefix(node: roxmltree::Node, uri: &str) -> Option<String> {
    if uri == XML_NS {
        return Some("xml".to_string());
    }
    node.namespaces()
        .find(|ns| ns.uri() == uri && ns.name().is_some())
        .and_then(|ns| ns.name())
        .map(String::from)
}

fn convert_element(node: roxmltree::Node, parent_scope: &[(Option<String>, String)]) -> Element {
    let scope = scope_of(node);
    let namespaces: Vec<(Option<String>, String)> = scope
        .iter()
        .filter(|decl| !parent_scope.contains(decl))
        .cloned()
        .collect();

    let tag = node.tag_name();
    let prefix = tag
        .namespace()
        .and_then(|uri| node.lookup_prefix(uri))
        .map(String::from);
    let name = QName {
        prefix,
        namespace: tag.namespace().map(String::from),
        local: tag.name().to_string(),
    };

    let attributes = node
        .attributes()
        .map(|a| Attribute {
            name: QName {
                prefix: a.namespace().and_then(|uri| attribute_prefix(node, uri)),
                namespace: a.namespace().map(String::from),
                local: a.name().to_string(),
            },
            value: a.value().to_string(),
        })
        .collect();

    let mut children = Vec::new();
    for child in node.children() {
        if child.is_element() {
            children.push(Node::Element(convert_element(child, &scope)));
        } else if child.is_text() {
            children.push(Node::Text(child.text().unwrap_or("").to_string()));
        } else if child.is_comment() {
            children.push(Node::Comment(child.text().unwrap_or("").to_string()));
        } else if let Some(pi) = child.pi() {
            children.push(Node::ProcessingInstruction {
                target: pi.target.to_string(),
                value: pi.value.map(String::from),
            });
        }
    }

    Element {
        name,
        namespaces,
        attributes,
        children,
    }
}

/// Serialize a part, prefixed with the standalone declaration Word writes.
pub fn to_string(root: &Element) -> String {
    let mut out =
        String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n");
    write_element(&mut out, root);
    out
}

fn write_element(out: &mut String, el: &Element) {
    out.push('<');
    el.name.write(out);
    for (prefix, uri) in &el.namespaces {
        match prefix {
            Some(p) => out.push_str(&format!(" xmlns:{}=\"", p)),
            None => out.push_str(" xmlns=\""),
        }
        out.push_str(&escape_attr(uri));
        out.push('"');
    }
    for attr in &el.attributes {
        out.push(' ');
        attr.name.write(out);
        out.push_str("=\"");
        out.push_str(&escape_attr(&attr.value));
        out.push('"');
    }
    if el.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &el.children {
        match child {
            Node::Element(e) => write_element(out, e),
            Node::Text(t) => out.push_str(&escape_text(t)),
            Node::Comment(c) => {
                out.push_str("<!--");
                out.push_str(c);
                out.push_str("-->");
            }
            Node::ProcessingInstruction { target, value } => {
                out.push_str("<?");
                out.push_str(target);
                if let Some(v) = value {
                    out.push(' ');
                    out.push_str(v);
                }
                out.push_str("?>");
            }
        }
    }
    out.push_str("</");
    el.name.write(out);
    out.push('>');
}

pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn escape_attr(s: &str) -> String {
    escape_text(s)
        .replace('"', "&quot;")
        .replace('\n', "&#10;")
        .replace('\r', "&#13;")
        .replace('\t', "&#9;")
}
