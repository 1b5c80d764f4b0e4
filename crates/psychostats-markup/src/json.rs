//! JSON export of rendered blocks.
//!
//! Used by `psychostats render --json` so other tools can consume lesson
//! structure without re-implementing the interpreter.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::{MarkupError, RenderBlock, Result};

/// Serializes a slice of [`RenderBlock`]s.
pub struct JsonExporter<'a> {
    blocks: &'a [RenderBlock],
}

impl<'a> JsonExporter<'a> {
    /// Creates an exporter for the given blocks.
    #[must_use]
    pub const fn new(blocks: &'a [RenderBlock]) -> Self {
        Self { blocks }
    }

    /// Compact single-line JSON.
    pub fn generate(&self) -> Result<String> {
        serde_json::to_string(self.blocks).map_err(MarkupError::from)
    }

    /// Indented JSON.
    pub fn generate_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self.blocks).map_err(MarkupError::from)
    }

    /// Writes the JSON to `path`, creating or truncating the file.
    pub fn write_to_file(&self, path: &Path, pretty: bool) -> Result<()> {
        let json = if pretty {
            self.generate_pretty()?
        } else {
            self.generate()?
        };
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }
}
