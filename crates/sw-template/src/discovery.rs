//! Source-tree discovery
//!
//! Walks the template root recursively and classifies every file by suffix.
//! Files that are neither `*.json` nor `*.json.<marker>` are ignored.
//!
//! Processing order is deterministic: all static documents first, then all
//! expression templates, each group sorted by relative path.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::document::{TemplateFile, TemplateKind};
use crate::error::{TemplateError, TemplateResult};

const JSON_SUFFIX: &str = ".json";

/// Naming conventions of a template tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSettings {
    /// Relative path of the entry-point document
    pub main_document: String,
    /// Suffix marking an expression template, without the dot
    pub expression_marker: String,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            main_document: "main.json".to_string(),
            expression_marker: "tera".to_string(),
        }
    }
}

impl TemplateSettings {
    fn expression_suffix(&self) -> String {
        format!("{JSON_SUFFIX}.{}", self.expression_marker)
    }

    /// Classify a relative path, returning its kind and document path
    fn classify(&self, relative: &str) -> Option<(TemplateKind, String)> {
        let expression_suffix = self.expression_suffix();
        if let Some(stem) = relative.strip_suffix(&expression_suffix) {
            Some((TemplateKind::Expression, format!("{stem}{JSON_SUFFIX}")))
        } else if relative.ends_with(JSON_SUFFIX) {
            Some((TemplateKind::Static, relative.to_string()))
        } else {
            None
        }
    }
}

/// A template root on disk
#[derive(Debug, Clone)]
pub struct TemplateSource {
    root: PathBuf,
    settings: TemplateSettings,
}

impl TemplateSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, settings: TemplateSettings) -> Self {
        Self {
            root: root.into(),
            settings,
        }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &TemplateSettings {
        &self.settings
    }

    /// List every template file in processing order
    ///
    /// # Errors
    /// - `TemplateError::Io` if a directory cannot be read
    /// - `TemplateError::DuplicateDocument` if a static file and an expression
    ///   template render to the same path
    pub fn discover(&self) -> TemplateResult<Vec<TemplateFile>> {
        let mut paths = Vec::new();
        walk(&self.root, &mut paths)?;

        let mut statics = Vec::new();
        let mut expressions = Vec::new();
        for path in paths {
            let Some(relative) = relative_path(&self.root, &path) else {
                continue;
            };
            let Some((kind, document_path)) = self.settings.classify(&relative) else {
                debug!(path = %relative, "ignoring non-template file");
                continue;
            };
            let file = TemplateFile {
                is_main: document_path == self.settings.main_document,
                source_path: path,
                relative_path: document_path,
                kind,
            };
            match kind {
                TemplateKind::Static => statics.push(file),
                TemplateKind::Expression => expressions.push(file),
            }
        }

        statics.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        expressions.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        let mut seen = HashSet::new();
        for file in statics.iter().chain(&expressions) {
            if !seen.insert(file.relative_path.as_str()) {
                return Err(TemplateError::DuplicateDocument(file.relative_path.clone()));
            }
        }

        statics.extend(expressions);
        debug!(root = %self.root.display(), count = statics.len(), "discovered templates");
        Ok(statics)
    }
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> TemplateResult<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| TemplateError::io_error(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| TemplateError::io_error(dir, e))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| TemplateError::io_error(&path, e))?;
        if file_type.is_dir() {
            walk(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

/// `/`-joined path of `path` below `root`
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "{}").unwrap();
    }

    fn order(files: &[TemplateFile]) -> Vec<(&str, TemplateKind)> {
        files
            .iter()
            .map(|f| (f.relative_path.as_str(), f.kind))
            .collect()
    }

    #[test]
    fn statics_precede_expressions_sorted_within_group() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "z.json");
        write(dir.path(), "a/b.json");
        write(dir.path(), "main.json.tera");
        write(dir.path(), "b.json.tera");

        let source = TemplateSource::new(dir.path(), TemplateSettings::default());
        let files = source.discover().unwrap();

        assert_eq!(
            order(&files),
            vec![
                ("a/b.json", TemplateKind::Static),
                ("z.json", TemplateKind::Static),
                ("b.json", TemplateKind::Expression),
                ("main.json", TemplateKind::Expression),
            ]
        );
        assert!(files[3].is_main);
        assert!(files[3].source_path.ends_with("main.json.tera"));
        assert!(!files[0].is_main);
    }

    #[test]
    fn unrelated_files_ignored() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md");
        write(dir.path(), "main.json.erb");
        write(dir.path(), "main.json");

        let files = TemplateSource::new(dir.path(), TemplateSettings::default())
            .discover()
            .unwrap();
        assert_eq!(order(&files), vec![("main.json", TemplateKind::Static)]);
    }

    #[test]
    fn nested_main_is_not_main() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "nested/main.json");

        let files = TemplateSource::new(dir.path(), TemplateSettings::default())
            .discover()
            .unwrap();
        assert!(!files[0].is_main);
    }

    #[test]
    fn static_and_expression_with_same_path_rejected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "main.json");
        write(dir.path(), "main.json.tera");

        let err = TemplateSource::new(dir.path(), TemplateSettings::default())
            .discover()
            .unwrap_err();
        assert!(matches!(err, TemplateError::DuplicateDocument(p) if p == "main.json"));
    }

    #[test]
    fn custom_marker() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "main.json.j2");

        let settings = TemplateSettings {
            expression_marker: "j2".to_string(),
            ..TemplateSettings::default()
        };
        let files = TemplateSource::new(dir.path(), settings).discover().unwrap();
        assert_eq!(order(&files), vec![("main.json", TemplateKind::Expression)]);
    }

    #[test]
    fn missing_root_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = TemplateSource::new(dir.path().join("absent"), TemplateSettings::default())
            .discover()
            .unwrap_err();
        assert!(matches!(err, TemplateError::Io { .. }));
    }
}
