//! Minimal XML element tree built on `quick-xml`.
//!
//! Plans only need element names, text content and child order, so attributes,
//! namespaces and mixed content positions are discarded.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// An element with its trimmed text content and child elements in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    fn new(start: &BytesStart<'_>) -> Result<Self, String> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|err| format!("element name is not utf-8: {err}"))?
            .to_string();
        Ok(Self {
            name,
            ..Self::default()
        })
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    /// All direct children with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Trimmed text of the first child named `name`, or `None` when the child is
    /// missing or its text is empty.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .map(|child| child.text.as_str())
            .filter(|text| !text.is_empty())
    }
}

/// Parse a document into its single root element.
///
/// Errors are plain strings; callers wrap them in their own error type.
pub fn parse_document(input: &str) -> Result<Element, String> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|err| format!("xml error at byte {}: {err}", reader.buffer_position()))?;
        match event {
            Event::Start(start) => {
                ensure_single_root(&root, &stack)?;
                stack.push(Element::new(&start)?);
            }
            Event::Empty(start) => {
                ensure_single_root(&root, &stack)?;
                let element = Element::new(&start)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                let mut element = stack
                    .pop()
                    .ok_or_else(|| "unexpected closing tag".to_string())?;
                element.text = element.text.trim().to_string();
                attach(&mut stack, &mut root, element);
            }
            Event::Text(text) => {
                let unescaped = text
                    .unescape()
                    .map_err(|err| format!("invalid text content: {err}"))?;
                push_text(&mut stack, &unescaped)?;
            }
            Event::CData(data) => {
                let raw = data.into_inner();
                push_text(&mut stack, &String::from_utf8_lossy(&raw))?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unclosed element <{}>", open.name));
    }
    root.ok_or_else(|| "document has no root element".to_string())
}

fn ensure_single_root(root: &Option<Element>, stack: &[Element]) -> Result<(), String> {
    if stack.is_empty() && root.is_some() {
        return Err("document has more than one root element".to_string());
    }
    Ok(())
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

fn push_text(stack: &mut [Element], text: &str) -> Result<(), String> {
    match stack.last_mut() {
        Some(current) => {
            current.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err("text outside of the root element".to_string()),
    }
}
