mod decode;
pub mod error;

pub use error::{ErrorKind, ParseError};

use tracing::debug;

use crate::Program;
use crate::parser::decode::Decoder;
use crate::xml;

/// Deepest element nesting a document may have, counting `<prog>` as level 1.
/// Anything deeper is rejected as [`ErrorKind::TooDeep`] before it is built.
pub const MAX_DEPTH: usize = 128;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    /// `file_id` is carried into every error so it can be rendered against a
    /// codespan-reporting file database.
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Parse the source XML into a complete Program.
    ///
    /// On failure nothing of the partially decoded program survives; the
    /// error is the only output.
    pub fn parse(&self) -> Result<Program, ParseError> {
        debug!(file_id = self.file_id, bytes = self.source.len(), "parsing program");

        let result = xml::read_document(&self.source, self.file_id)
            .and_then(|root| Decoder::new(self.file_id).program(&root));

        match &result {
            Ok(program) => debug!(
                functions = program.len(),
                nodes = program.node_count(),
                "parsed program"
            ),
            Err(error) => debug!(%error, "rejected corrupted program"),
        }
        result
    }
}
