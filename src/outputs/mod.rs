//! Output generation for finished documents and run reports.
//!
//! # Submodules
//!
//! - [`pdf`]: lays a [`Document`] out on A4 sheets and writes it as PDF
//! - [`json`]: writes the per-run report next to the document
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── articles_rtbf_20241014_093000.pdf
//! └── articles_rtbf_20241014_093000.pdf.json   # with --report
//! ```

pub mod json;
pub mod pdf;

use crate::document::Document;
use crate::error::WriteError;
use std::path::Path;

/// Serializes a finished [`Document`] to persistent storage.
///
/// Implementations must either produce the complete artifact at `path` or
/// leave nothing there.
pub trait DocumentWriter {
    /// File extension of the produced artifact, without the dot.
    fn extension(&self) -> &'static str;

    fn write(&self, document: &Document, path: &Path) -> Result<(), WriteError>;
}

impl<T: DocumentWriter + ?Sized> DocumentWriter for &T {
    fn extension(&self) -> &'static str {
        (**self).extension()
    }

    fn write(&self, document: &Document, path: &Path) -> Result<(), WriteError> {
        (**self).write(document, path)
    }
}
