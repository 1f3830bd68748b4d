use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use thiserror::Error;

/// Why a document was rejected. Every kind means the same thing to the
/// editor: the file is corrupted and cannot be opened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("document has no <prog> root element")]
    MissingRoot,
    #[error("<{element}> is missing required attribute `{attribute}`")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },
    #[error("<{element}> is missing required child <{child}>")]
    MissingChild {
        element: String,
        child: &'static str,
    },
    #[error("unexpected <{tag}> inside <{parent}>")]
    UnknownTag { tag: String, parent: String },
    #[error("<{element}> has more than one <{child}>")]
    DuplicateChild {
        element: String,
        child: &'static str,
    },
    #[error("function `{0}` is defined more than once")]
    DuplicateFunction(String),
    #[error("elements are nested more than {0} levels deep")]
    TooDeep(usize),
    #[error("malformed XML: {0}")]
    Malformed(String),
}

/// A corrupted-input report, pointing at the offending tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("corrupted program: {kind}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub span: Range<usize>,
    pub file_id: usize,
    pub notes: Vec<String>,
}

impl ParseError {
    pub fn new(kind: ErrorKind, span: Range<usize>, file_id: usize) -> Self {
        ParseError {
            kind,
            span,
            file_id,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::error()
            .with_message(self.to_string())
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }
}
