//! Discovered source files and rendered documents

use std::path::PathBuf;

/// How a source file is turned into a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// `*.json`, published byte-for-byte
    Static,
    /// `*.json.<marker>`, evaluated against the namespace
    Expression,
}

/// A source file found under the template root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    /// Absolute path on disk
    pub source_path: PathBuf,
    /// Path relative to the root with `/` separators and the marker suffix stripped
    pub relative_path: String,
    pub kind: TemplateKind,
    /// Whether `relative_path` is the main document
    pub is_main: bool,
}

/// A rendered document ready for validation and publication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDocument {
    pub source_path: PathBuf,
    pub relative_path: String,
    pub kind: TemplateKind,
    /// Rendered JSON text
    pub content: String,
    pub is_main: bool,
}

impl TemplateDocument {
    /// Build a document from its source file and rendered content
    #[must_use]
    pub fn from_file(file: &TemplateFile, content: String) -> Self {
        Self {
            source_path: file.source_path.clone(),
            relative_path: file.relative_path.clone(),
            kind: file.kind,
            content,
            is_main: file.is_main,
        }
    }
}
