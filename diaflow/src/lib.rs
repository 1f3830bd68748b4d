pub mod block;
pub mod comp;
pub mod config;
pub mod error;
pub mod parser;
pub mod serialize;
pub mod xml;

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

pub use crate::block::{Block, Case};
pub use crate::comp::Comp;
pub use crate::config::WriteOptions;
pub use crate::error::FileError;
pub use crate::parser::{ErrorKind, MAX_DEPTH, ParseError, Parser};

/// A function: ordered parameter names and the statements it runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Function {
    pub params: Vec<String>,
    pub body: Comp,
}

/// A whole Diaflow program: every function, keyed by its unique name.
///
/// Functions are kept sorted by name, so enumeration order has nothing to do
/// with the order they were created or stored in a file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    /// Open for the editor to remove or rename entries directly.
    pub functions: BTreeMap<String, Function>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }

    /// Look up `name`, creating an empty function if there is none yet.
    /// Every call with the same name hands back the same entry.
    pub fn function(&mut self, name: &str) -> &mut Function {
        self.functions.entry(name.to_string()).or_default()
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Function)> {
        self.functions.iter().map(|(name, f)| (name.as_str(), f))
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Total statements across all function bodies.
    pub fn node_count(&self) -> usize {
        self.functions.values().map(|f| f.body.node_count()).sum()
    }

    pub fn from_xml(source: &str) -> Result<Program, ParseError> {
        Parser::new(source.to_string(), 0).parse()
    }

    /// Open a saved program. A file that reads fine but is not a valid
    /// program comes back as [`FileError::Corrupt`].
    pub fn from_file(path: &Path) -> Result<Program, FileError> {
        debug!(path = %path.display(), "loading program");
        let source = Program::read_source(path, 0)?;
        Ok(Program::from_xml(&source)?)
    }

    /// Read the text of a program file without parsing it.
    ///
    /// Only a failed read is [`FileError::Io`]. Bytes that are not UTF-8 make
    /// the file corrupt, with the span at the first bad byte.
    pub fn read_source(path: &Path, file_id: usize) -> Result<String, FileError> {
        let bytes = std::fs::read(path).map_err(|source| FileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        String::from_utf8(bytes).map_err(|e| {
            let at = e.utf8_error().valid_up_to();
            let message = format!("not valid UTF-8 (first bad byte at offset {at})");
            FileError::Corrupt(ParseError::new(ErrorKind::Malformed(message), at..at, file_id))
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), FileError> {
        self.save_with(path, &WriteOptions::default())
    }

    pub fn save_with(&self, path: &Path, options: &WriteOptions) -> Result<(), FileError> {
        let mut text = self.to_xml_string_with(options);
        text.push('\n');
        std::fs::write(path, text).map_err(|source| FileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), functions = self.len(), "saved program");
        Ok(())
    }
}
