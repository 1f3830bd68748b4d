use std::ops::Range;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::parser::MAX_DEPTH;
use crate::parser::error::{ErrorKind, ParseError};
use crate::xml::Element;

/// Read `source` into an element tree and return its root element.
///
/// Text, comments, CDATA, processing instructions and the XML declaration are
/// skipped. A document with no element at all is reported as
/// [`ErrorKind::MissingRoot`]; anything quick-xml rejects is
/// [`ErrorKind::Malformed`]. Elements nested deeper than [`MAX_DEPTH`] stop
/// the read with [`ErrorKind::TooDeep`], so the tree never grows past it.
pub fn read_document(source: &str, file_id: usize) -> Result<Element, ParseError> {
    let mut reader = Reader::from_str(source);
    // Elements still waiting for their end tag, innermost last.
    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let start = reader.buffer_position() as usize;
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                let end = reader.buffer_position() as usize;
                return Err(malformed(e.to_string(), start..end, file_id));
            }
        };
        let end = reader.buffer_position() as usize;

        match event {
            Event::Start(tag) => {
                let span = tag_span(source, end);
                check_depth(&open, &span, file_id)?;
                open.push(element_from_tag(&tag, span, file_id)?);
            }
            Event::Empty(tag) => {
                let span = tag_span(source, end);
                check_depth(&open, &span, file_id)?;
                let element = element_from_tag(&tag, span, file_id)?;
                attach(element, &mut open, &mut root, file_id)?;
            }
            Event::End(_) => {
                let Some(element) = open.pop() else {
                    return Err(malformed("unmatched end tag", start..end, file_id));
                };
                attach(element, &mut open, &mut root, file_id)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(unclosed) = open.pop() {
        let message = format!("<{}> is never closed", unclosed.name);
        return Err(malformed(message, unclosed.span, file_id));
    }

    root.ok_or_else(|| ParseError::new(ErrorKind::MissingRoot, 0..0, file_id))
}

/// Byte range of the tag that ends at `end`. Attribute values cannot hold a
/// raw `<`, so the nearest one before `end` opens the tag.
fn tag_span(source: &str, end: usize) -> Range<usize> {
    let end = end.min(source.len());
    let start = source[..end].rfind('<').unwrap_or(0);
    start..end
}

fn check_depth(open: &[Element], span: &Range<usize>, file_id: usize) -> Result<(), ParseError> {
    if open.len() >= MAX_DEPTH {
        return Err(ParseError::new(
            ErrorKind::TooDeep(MAX_DEPTH),
            span.clone(),
            file_id,
        ));
    }
    Ok(())
}

fn attach(
    element: Element,
    open: &mut [Element],
    root: &mut Option<Element>,
    file_id: usize,
) -> Result<(), ParseError> {
    if let Some(parent) = open.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(malformed(
            "more than one root element",
            element.span.clone(),
            file_id,
        ));
    }
    *root = Some(element);
    Ok(())
}

fn element_from_tag(
    tag: &BytesStart<'_>,
    span: Range<usize>,
    file_id: usize,
) -> Result<Element, ParseError> {
    let name = std::str::from_utf8(tag.name().as_ref())
        .map_err(|e| malformed(e.to_string(), span.clone(), file_id))?
        .to_string();

    let mut element = Element::new(name);
    for attr in tag.attributes() {
        let attr = attr.map_err(|e| malformed(e.to_string(), span.clone(), file_id))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| malformed(e.to_string(), span.clone(), file_id))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| malformed(e.to_string(), span.clone(), file_id))?
            .into_owned();
        element.attributes.push((key, value));
    }
    element.span = span;
    Ok(element)
}

fn malformed(message: impl Into<String>, span: Range<usize>, file_id: usize) -> ParseError {
    ParseError::new(ErrorKind::Malformed(message.into()), span, file_id)
}
