// Namespace-aware element tree shared by the instance, schema and linkbase parsers
use crate::{Error, Result};
use compact_str::CompactString;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::sync::Arc;

pub mod ns {
    pub const XBRLI: &str = "http://www.xbrl.org/2003/instance";
    pub const LINK: &str = "http://www.xbrl.org/2003/linkbase";
    pub const XLINK: &str = "http://www.w3.org/1999/xlink";
    pub const XBRLDI: &str = "http://xbrl.org/2006/xbrldi";
    pub const XSD: &str = "http://www.w3.org/2001/XMLSchema";
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
}

/// In-scope `xmlns` bindings. A new scope is only allocated for elements
/// that declare namespaces; everything else shares its parent's.
#[derive(Debug, Default)]
struct Scope {
    bindings: Vec<(CompactString, CompactString)>,
    parent: Option<Arc<Scope>>,
}

impl Scope {
    fn resolve(&self, prefix: &str) -> Option<&str> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            let binding = current.bindings.iter().rev().find(|(p, _)| p.as_str() == prefix);
            if let Some((_, uri)) = binding {
                // xmlns="" undeclares the default namespace
                return if uri.is_empty() { None } else { Some(uri.as_str()) };
            }
            scope = current.parent.as_deref();
        }
        (prefix == "xml").then_some(ns::XML)
    }

    fn prefix_of(&self, namespace: &str) -> Option<&str> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some((prefix, _)) = current
                .bindings
                .iter()
                .rev()
                .find(|(p, uri)| !p.is_empty() && uri.as_str() == namespace)
            {
                return Some(prefix.as_str());
            }
            scope = current.parent.as_deref();
        }
        None
    }
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub namespace: Option<CompactString>,
    pub local: CompactString,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub namespace: Option<CompactString>,
    pub prefix: Option<CompactString>,
    pub local: CompactString,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Element>,
    text: String,
    // Text following this element's end tag, inside its parent
    tail: String,
    scope: Arc<Scope>,
}

impl Element {
    #[inline]
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.local.as_str() == local && self.namespace.as_deref() == Some(namespace)
    }

    pub fn local_name(&self) -> &str {
        &self.local
    }

    /// Name as written in the document, `prefix:local` or just `local`.
    pub fn qualified_name(&self) -> CompactString {
        match &self.prefix {
            Some(prefix) => compact_str::format_compact!("{}:{}", prefix, self.local),
            None => self.local.clone(),
        }
    }

    /// Leading text content, trimmed. For simple-content elements this is
    /// the whole value.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// All text below this element in document order, whitespace-collapsed.
    pub fn deep_text(&self) -> String {
        fn walk(element: &Element, out: &mut String) {
            out.push_str(&element.text);
            for child in &element.children {
                walk(child, out);
                out.push_str(&child.tail);
            }
        }
        let mut raw = String::new();
        walk(self, &mut raw);
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Unqualified attribute lookup.
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.local.as_str() == local)
            .map(|a| a.value.as_str())
    }

    pub fn attr_ns(&self, namespace: &str, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.local.as_str() == local && a.namespace.as_deref() == Some(namespace))
            .map(|a| a.value.as_str())
    }

    #[inline]
    pub fn xlink(&self, local: &str) -> Option<&str> {
        self.attr_ns(ns::XLINK, local)
    }

    pub fn children_named<'a>(
        &'a self,
        namespace: &'a str,
        local: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.is(namespace, local))
    }

    pub fn child(&self, namespace: &str, local: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.is(namespace, local))
    }

    /// Depth-first, document-order search below this element.
    pub fn descendants<'a>(&'a self, namespace: &str, local: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        let mut stack: Vec<&Element> = self.children.iter().rev().collect();
        while let Some(element) = stack.pop() {
            if element.is(namespace, local) {
                found.push(element);
            }
            stack.extend(element.children.iter().rev());
        }
        found
    }

    pub fn resolve_prefix(&self, prefix: &str) -> Option<&str> {
        self.scope.resolve(prefix)
    }

    /// Innermost non-default prefix bound to `namespace`.
    pub fn prefix_for(&self, namespace: &str) -> Option<&str> {
        self.scope.prefix_of(namespace)
    }

    /// Resolves a QName appearing in text content (`iso4217:USD`) against the
    /// bindings in scope at this element.
    pub fn resolve_qname<'a>(&'a self, qname: &'a str) -> (Option<&'a str>, &'a str) {
        let (prefix, local) = split_qname(qname);
        (self.scope.resolve(prefix.unwrap_or("")), local)
    }
}

impl Element {
    fn push_text(&mut self, text: &str) {
        match self.children.last_mut() {
            Some(last) => last.tail.push_str(text),
            None => self.text.push_str(text),
        }
    }
}

#[derive(Debug, Clone)]
pub struct XmlDocument {
    pub root: Element,
}

impl XmlDocument {
    pub fn parse(data: &[u8]) -> Result<Self> {
        // Skip BOM if present
        let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);

        let mut reader = Reader::from_reader(data);
        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(start)) => {
                    let parent = stack.last().map(|e| e.scope.clone());
                    stack.push(open_element(&start, parent)?);
                }
                Ok(Event::Empty(start)) => {
                    let parent = stack.last().map(|e| e.scope.clone());
                    let element = open_element(&start, parent)?;
                    close_element(element, &mut stack, &mut root)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::MalformedXml("unexpected closing tag".to_string()))?;
                    close_element(element, &mut stack, &mut root)?;
                }
                Ok(Event::Text(text)) => {
                    if let Some(current) = stack.last_mut() {
                        let text = text.unescape().map_err(malformed)?;
                        current.push_text(&text);
                    }
                }
                Ok(Event::CData(cdata)) => {
                    if let Some(current) = stack.last_mut() {
                        current.push_text(&String::from_utf8_lossy(&cdata.into_inner()));
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(Error::MalformedXml(format!(
                        "at byte {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(Error::MalformedXml(format!(
                "unclosed element <{}>",
                open.qualified_name()
            )));
        }

        root.map(|root| Self { root })
            .ok_or_else(|| Error::MalformedXml("document has no root element".to_string()))
    }
}

fn open_element(start: &BytesStart<'_>, parent: Option<Arc<Scope>>) -> Result<Element> {
    let mut bindings = Vec::new();
    let mut raw = Vec::new();

    for attr in start.attributes() {
        let attr = attr.map_err(malformed)?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|_| Error::MalformedXml("invalid UTF-8 in attribute name".to_string()))?
            .to_string();
        let value = attr.unescape_value().map_err(malformed)?.into_owned();

        if key == "xmlns" {
            bindings.push((CompactString::new(""), CompactString::from(value)));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            bindings.push((CompactString::from(prefix), CompactString::from(value)));
        } else {
            raw.push((key, value));
        }
    }

    let scope = if bindings.is_empty() {
        parent.unwrap_or_default()
    } else {
        Arc::new(Scope { bindings, parent })
    };

    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|_| Error::MalformedXml("invalid UTF-8 in tag name".to_string()))?
        .to_string();
    let (prefix, local) = split_qname(&name);
    let namespace = scope.resolve(prefix.unwrap_or("")).map(CompactString::from);

    // Unprefixed attributes are never in the default namespace
    let attributes = raw
        .into_iter()
        .map(|(key, value)| {
            let (prefix, local) = split_qname(&key);
            Attribute {
                namespace: prefix.and_then(|p| scope.resolve(p)).map(CompactString::from),
                local: CompactString::from(local),
                value,
            }
        })
        .collect();

    Ok(Element {
        namespace,
        prefix: prefix.map(CompactString::from),
        local: CompactString::from(local),
        attributes,
        children: Vec::new(),
        text: String::new(),
        tail: String::new(),
        scope,
    })
}

fn close_element(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => {
            return Err(Error::MalformedXml("multiple root elements".to_string()))
        }
        None => *root = Some(element),
    }
    Ok(())
}

fn malformed<E: std::fmt::Display>(e: E) -> Error {
    Error::MalformedXml(e.to_string())
}

pub fn split_qname(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

/// Maps a locator href (`us-gaap-2023.xsd#us-gaap_Revenues`) to the concept id
/// used for facts (`us-gaap:Revenues`).
pub fn href_to_concept(href: &str) -> Option<CompactString> {
    let (_, fragment) = href.rsplit_once('#')?;
    if fragment.is_empty() {
        return None;
    }
    Some(element_id_to_concept(fragment))
}

/// Schema element ids join prefix and name with the first underscore.
pub fn element_id_to_concept(id: &str) -> CompactString {
    match id.split_once('_') {
        Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => {
            compact_str::format_compact!("{}:{}", prefix, local)
        }
        _ => CompactString::from(id),
    }
}

/// Local part of a concept id.
pub fn local_name(concept: &str) -> &str {
    split_qname(concept).1
}
