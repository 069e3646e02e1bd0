//! The normalized plan document that the strategic chunker consumes.
//!
//! A `PlanDocument` is the pipeline's only representation of "the input":
//! normalized text plus enough metadata to reconstruct provenance. Actual
//! PDF extraction happens upstream of this crate; by the time text reaches
//! here it is already plain, paginated text.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::io::unicode::lines_with_offsets;

/// A loaded, normalized plan document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDocument {
    /// Municipality or plan identifier.
    pub id: String,
    /// Source file path, if loaded from disk.
    pub source: Option<PathBuf>,
    /// Normalized text content.
    pub content: String,
    /// Page boundaries as byte offsets into `content`, one past-the-end
    /// offset per page in order. `page_breaks[0]` is the end of page 1.
    pub page_breaks: Vec<usize>,
    /// Document metadata.
    pub metadata: DocumentMetadata,
}

/// Metadata associated with a plan document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Size in bytes.
    pub size: usize,
    /// Number of lines.
    pub line_count: usize,
    /// SHA-256 content hash, hex-encoded.
    pub content_hash: String,
}

impl PlanDocument {
    /// Builds a document from raw content and explicit page breaks.
    #[must_use]
    pub fn new(id: impl Into<String>, content: String, page_breaks: Vec<usize>) -> Self {
        let size = content.len();
        let line_count = content.lines().count();
        let content_hash = crate::manifest::hashing::sha256_hex(content.as_bytes());
        Self {
            id: id.into(),
            source: None,
            content,
            page_breaks,
            metadata: DocumentMetadata {
                size,
                line_count,
                content_hash,
            },
        }
    }

    /// Loads a document from a file, treating the form-feed character
    /// (`\x0c`) as the page separator left by the upstream text extractor.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn from_file(id: impl Into<String>, path: PathBuf) -> crate::Result<Self> {
        let content = crate::io::read_file(&path)?;
        let mut page_breaks = Vec::new();
        for (offset, ch) in content.char_indices() {
            if ch == '\x0c' {
                page_breaks.push(offset);
            }
        }
        page_breaks.push(content.len());
        let mut doc = Self::new(id, content, page_breaks);
        doc.source = Some(path);
        Ok(doc)
    }

    /// Returns the 1-based page number containing the given byte offset.
    #[must_use]
    pub fn page_at(&self, offset: usize) -> u32 {
        for (i, &brk) in self.page_breaks.iter().enumerate() {
            if offset < brk {
                return u32::try_from(i + 1).unwrap_or(u32::MAX);
            }
        }
        u32::try_from(self.page_breaks.len().max(1)).unwrap_or(u32::MAX)
    }

    /// Iterates over lines with their byte offsets, delegating to the
    /// shared unicode helpers used across the crate.
    pub fn lines_with_offsets(&self) -> impl Iterator<Item = (usize, &str)> {
        lines_with_offsets(&self.content)
    }

    /// Returns the number of characters in the document.
    #[must_use]
    pub fn size(&self) -> usize {
        self.content.chars().count()
    }
}
