use serde::Deserialize;

/// Layout of the XML text produced by the serializer.
///
/// Loaded from the `[write]` table of `diaflow.toml` by the command line
/// tool; missing keys fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WriteOptions {
    /// Spaces per nesting level.
    pub indent: usize,
    /// Print the whole document on one line, ignoring `indent`.
    pub compact: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            indent: 4,
            compact: false,
        }
    }
}

impl WriteOptions {
    pub fn compact() -> Self {
        WriteOptions {
            compact: true,
            ..WriteOptions::default()
        }
    }
}
