//! Generated-document synthesis and index maintenance.
//!
//! This module provides:
//! - Title, date and summary-body synthesis for per-folder READMEs
//! - The auto-generation marker used as the reprocessing guard
//! - Merging of new entries into the repository index documents

pub mod document;
pub mod index;

pub use document::{is_auto_generated, render_document, GeneratedDocument, AUTO_MARKER};
pub use index::{update_index_file, verify_markers, IndexEntry, IndexLocation};
