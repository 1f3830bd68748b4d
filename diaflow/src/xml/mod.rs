//! A small owned XML element tree.
//!
//! The serializer builds one of these and prints it; the parser reads the
//! source text into one and then walks it. Only elements and attributes are
//! modelled: the program format never stores anything in text nodes.

mod reader;

pub use reader::read_document;

use std::borrow::Cow;
use std::ops::Range;

use quick_xml::Writer;
use quick_xml::escape::escape;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::config::WriteOptions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    /// Attributes in document order. Keys are unique.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    /// Byte range of the start tag in the parsed source, `0..0` when the
    /// element was built in memory.
    pub span: Range<usize>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            span: 0..0,
        }
    }

    /// Set `key` to `value`, overwriting in place if the key already exists.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Append a new empty child named `name` and return it for filling in.
    pub fn append_child(&mut self, name: impl Into<String>) -> &mut Element {
        self.children.push(Element::new(name));
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn first_child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Print this element and everything below it as XML text.
    pub fn write_to(&self, options: &WriteOptions) -> String {
        let mut writer = if options.compact || options.indent == 0 {
            Writer::new(Vec::new())
        } else {
            Writer::new_with_indent(Vec::new(), b' ', options.indent)
        };
        self.write_events(&mut writer)
            .expect("writing XML into a Vec cannot fail");
        String::from_utf8_lossy(&writer.into_inner()).into_owned()
    }

    fn write_events(&self, writer: &mut Writer<Vec<u8>>) -> std::io::Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            let value = escape_attribute(value);
            start.push_attribute((key.as_bytes(), value.as_bytes()));
        }

        if self.children.is_empty() {
            return emit(writer, Event::Empty(start));
        }

        emit(writer, Event::Start(start))?;
        for child in &self.children {
            child.write_events(writer)?;
        }
        emit(writer, Event::End(BytesEnd::new(self.name.as_str())))
    }
}

/// Escape an attribute value for writing. Besides the markup characters,
/// tabs and line breaks become character references so that readers which
/// normalize attribute whitespace still see them.
fn escape_attribute(value: &str) -> Cow<'_, str> {
    let escaped = escape(value);
    if !escaped.contains(['\n', '\r', '\t']) {
        return escaped;
    }
    Cow::Owned(
        escaped
            .replace('\r', "&#13;")
            .replace('\n', "&#10;")
            .replace('\t', "&#9;"),
    )
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> std::io::Result<()> {
    writer
        .write_event(event)
        .map_err(|e| std::io::Error::other(e.to_string()))
}
