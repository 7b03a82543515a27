//! Well-formedness checking and element-tree construction.
//!
//! The dump is read in one pass with `quick-xml` into a small owned tree of
//! [`Element`]s. Declarations, doctype, comments and processing instructions
//! are dropped; rrdtool annotates rows with timestamp comments, so text on
//! either side of a comment is joined back together.
//!
//! Elements nested deeper than [`MAX_DEPTH`] are still checked for
//! well-formedness but are not kept. The deepest element the dump schema
//! names sits five levels below the root, and a bounded tree keeps both
//! building and dropping it off the recursion limit.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::StructuralError;

/// Nesting depth, counting the root as 1, beyond which elements are skipped.
pub const MAX_DEPTH: usize = 32;

/// One element of the dump: its local name, unescaped text and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    /// Local element name, without namespace prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All text directly inside this element, entities resolved.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Child elements in document order.
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// First child named `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children named `name`, in document order.
    pub fn children_named<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a Element> + use<'a, 'n> {
        self.children.iter().filter(move |c| c.name == name)
    }
}

/// Parses `bytes` into the root element.
///
/// # Errors
///
/// Returns [`StructuralError`] if the buffer is empty, is not well-formed,
/// ends inside an element, or holds no element at all.
pub fn parse(bytes: &[u8]) -> Result<Element, StructuralError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(StructuralError::Empty);
    }

    let mut reader = Reader::from_reader(bytes);
    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    // Open elements below MAX_DEPTH that are being skipped.
    let mut skipped: usize = 0;

    loop {
        let event = reader.read_event().map_err(|e| StructuralError::Markup {
            position: position(&reader),
            reason: e.to_string(),
        })?;

        match event {
            Event::Start(_) if open.len() >= MAX_DEPTH => skipped += 1,
            Event::Empty(_) if open.len() >= MAX_DEPTH => {}
            Event::End(_) if skipped > 0 => skipped -= 1,
            Event::Text(_) | Event::CData(_) if skipped > 0 => {}
            Event::Start(start) => {
                let name = utf8(start.local_name().as_ref(), &reader)?.to_string();
                if open.is_empty() && root.is_some() {
                    return Err(multiple_roots(&reader));
                }
                open.push(Element {
                    name,
                    ..Element::default()
                });
            }
            Event::Empty(start) => {
                let element = Element {
                    name: utf8(start.local_name().as_ref(), &reader)?.to_string(),
                    ..Element::default()
                };
                close(element, &mut open, &mut root, &reader)?;
            }
            Event::End(_) => {
                // quick-xml has already matched the end name against the start.
                let Some(element) = open.pop() else {
                    return Err(StructuralError::Markup {
                        position: position(&reader),
                        reason: "end tag without matching start tag".to_string(),
                    });
                };
                close(element, &mut open, &mut root, &reader)?;
            }
            Event::Text(text) => {
                if let Some(current) = open.last_mut() {
                    let unescaped = text.unescape().map_err(|e| StructuralError::Markup {
                        position: position(&reader),
                        reason: e.to_string(),
                    })?;
                    current.text.push_str(&unescaped);
                }
            }
            Event::CData(data) => {
                if let Some(current) = open.last_mut() {
                    current.text.push_str(utf8(&data, &reader)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(element) = open.pop() {
        return Err(StructuralError::Unclosed {
            element: element.name,
        });
    }
    root.ok_or(StructuralError::NoRoot)
}

/// Attaches a finished element to its parent, or makes it the root.
fn close(
    element: Element,
    open: &mut [Element],
    root: &mut Option<Element>,
    reader: &Reader<&[u8]>,
) -> Result<(), StructuralError> {
    match open.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(multiple_roots(reader)),
    }
    Ok(())
}

fn multiple_roots(reader: &Reader<&[u8]>) -> StructuralError {
    StructuralError::Markup {
        position: position(reader),
        reason: "more than one root element".to_string(),
    }
}

fn utf8<'b>(bytes: &'b [u8], reader: &Reader<&[u8]>) -> Result<&'b str, StructuralError> {
    std::str::from_utf8(bytes).map_err(|e| StructuralError::Markup {
        position: position(reader),
        reason: e.to_string(),
    })
}

fn position(reader: &Reader<&[u8]>) -> u64 {
    reader.buffer_position()
}
