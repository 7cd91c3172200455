//! In-memory zip assembly for produced segments.
//!
//! Entries are appended as segments arrive; `finalize` consumes the builder
//! so it cannot run twice, and fails when nothing was added.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::SplitError;

pub struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    names: HashSet<String>,
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            names: HashSet::new(),
        }
    }

    /// Append one named entry. Duplicate names are rejected and leave the
    /// archive untouched.
    pub fn add(&mut self, name: &str, bytes: &[u8]) -> Result<(), SplitError> {
        if self.names.contains(name) {
            return Err(SplitError::DuplicateName(name.to_string()));
        }
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.writer.start_file(name, options)?;
        self.writer.write_all(bytes)?;
        self.names.insert(name.to_string());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Produce the archive bytes. Fails with `EmptyArchive` when no entry
    /// was ever added.
    pub fn finalize(self) -> Result<Vec<u8>, SplitError> {
        if self.names.is_empty() {
            return Err(SplitError::EmptyArchive);
        }
        let cursor = self.writer.finish()?;
        Ok(cursor.into_inner())
    }
}
