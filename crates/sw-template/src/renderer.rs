//! Document rendering
//!
//! Static documents are read verbatim. Expression templates are evaluated by
//! Tera with the configuration namespace bound as the single variable
//! `config`, so `{{ config.stackwrightName }}` or
//! `{{ config.databaseSize | default(value=10) }}` resolve against it and
//! the output must parse as JSON. Static documents are left for the
//! provisioning service to judge.

use std::error::Error as _;

use serde::de::IgnoredAny;
use sw_model::ConfigurationNamespace;
use tera::{Context, Tera};
use tracing::debug;

use crate::document::{TemplateDocument, TemplateFile, TemplateKind};
use crate::error::{TemplateError, TemplateResult};

/// Name under which the namespace is visible to expression templates
pub const NAMESPACE_VARIABLE: &str = "config";

/// Turns discovered files into documents
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Render one file against the namespace
    ///
    /// # Errors
    /// - `TemplateError::Io` if the source file cannot be read
    /// - `TemplateError::Render` if evaluation fails or an expression's output
    ///   is not JSON
    pub fn render(
        &self,
        file: &TemplateFile,
        namespace: &ConfigurationNamespace,
    ) -> TemplateResult<TemplateDocument> {
        let source = std::fs::read_to_string(&file.source_path)
            .map_err(|e| TemplateError::io_error(&file.source_path, e))?;

        let content = match file.kind {
            TemplateKind::Static => source,
            TemplateKind::Expression => {
                let output = evaluate(&file.relative_path, &source, namespace)?;
                serde_json::from_str::<IgnoredAny>(&output).map_err(|e| {
                    TemplateError::render(&file.relative_path, format!("output is not valid JSON: {e}"))
                })?;
                output
            }
        };

        debug!(
            path = %file.relative_path,
            kind = ?file.kind,
            bytes = content.len(),
            "rendered document"
        );
        Ok(TemplateDocument::from_file(file, content))
    }
}

fn evaluate(name: &str, source: &str, namespace: &ConfigurationNamespace) -> TemplateResult<String> {
    let mut tera = Tera::default();
    tera.add_raw_template(name, source)
        .map_err(|e| TemplateError::render(name, error_chain(&e)))?;

    let mut context = Context::new();
    context.insert(NAMESPACE_VARIABLE, namespace);

    tera.render(name, &context)
        .map_err(|e| TemplateError::render(name, error_chain(&e)))
}

/// Tera nests the useful detail in `source()`; flatten it into one line
fn error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use sw_model::{EncryptionKeyId, StackIdentity, StorageLocation, TargetParameters};
    use tempfile::TempDir;

    fn namespace() -> ConfigurationNamespace {
        let mut values = IndexMap::new();
        values.insert("databaseSize".to_string(), json!(20));
        values.insert("tags".to_string(), json!({"team": "platform"}));
        ConfigurationNamespace::new(
            StackIdentity::new("acme", "web", "production"),
            StorageLocation::new("acme-deployments", "eu-west-1"),
            EncryptionKeyId::new("key-prod"),
            TargetParameters::from_map(values).unwrap(),
        )
    }

    fn file(dir: &TempDir, name: &str, kind: TemplateKind, body: &str) -> TemplateFile {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        TemplateFile {
            source_path: path,
            relative_path: name.trim_end_matches(".tera").to_string(),
            kind,
            is_main: false,
        }
    }

    #[test]
    fn static_content_is_verbatim() {
        let dir = TempDir::new().unwrap();
        let body = "{\n  \"Resources\" : { \"{{ not evaluated }}\": 1 }\n}\n";
        let f = file(&dir, "vpc.json", TemplateKind::Static, body);

        let doc = TemplateRenderer::new().render(&f, &namespace()).unwrap();
        assert_eq!(doc.content, body);
        assert_eq!(doc.kind, TemplateKind::Static);
    }

    #[test]
    fn expression_sees_reserved_and_target_values() {
        let dir = TempDir::new().unwrap();
        let f = file(
            &dir,
            "main.json.tera",
            TemplateKind::Expression,
            r#"{"Name": "{{ config.stackwrightName }}", "Bucket": "{{ config.stackwrightS3Bucket }}", "Size": {{ config.databaseSize }}, "Team": "{{ config.tags.team }}"}"#,
        );

        let doc = TemplateRenderer::new().render(&f, &namespace()).unwrap();
        let value: Value = serde_json::from_str(&doc.content).unwrap();
        assert_eq!(
            value,
            json!({"Name": "web", "Bucket": "acme-deployments", "Size": 20, "Team": "platform"})
        );
        assert_eq!(doc.relative_path, "main.json");
    }

    #[test]
    fn undefined_variable_is_render_error() {
        let dir = TempDir::new().unwrap();
        let f = file(
            &dir,
            "broken.json.tera",
            TemplateKind::Expression,
            r#"{"Value": "{{ config.missingKey }}"}"#,
        );

        let err = TemplateRenderer::new().render(&f, &namespace()).unwrap_err();
        match err {
            TemplateError::Render { path, message } => {
                assert_eq!(path, "broken.json");
                assert!(message.contains("missingKey"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn default_filter_covers_missing_key() {
        let dir = TempDir::new().unwrap();
        let f = file(
            &dir,
            "opt.json.tera",
            TemplateKind::Expression,
            r#"{"Count": {{ config.instanceCount | default(value=1) }}}"#,
        );

        let doc = TemplateRenderer::new().render(&f, &namespace()).unwrap();
        assert_eq!(doc.content, r#"{"Count": 1}"#);
    }

    #[test]
    fn invalid_json_output_rejected() {
        let dir = TempDir::new().unwrap();
        let f = file(
            &dir,
            "bad.json.tera",
            TemplateKind::Expression,
            "{ \"Name\": {{ config.stackwrightName }} }",
        );

        let err = TemplateRenderer::new().render(&f, &namespace()).unwrap_err();
        match err {
            TemplateError::Render { path, message } => {
                assert_eq!(path, "bad.json");
                assert!(message.contains("not valid JSON"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_static_passes_through() {
        let dir = TempDir::new().unwrap();
        let f = file(&dir, "bad.json", TemplateKind::Static, "{ not json");

        let doc = TemplateRenderer::new().render(&f, &namespace()).unwrap();
        assert_eq!(doc.content, "{ not json");
    }

    #[test]
    fn syntax_error_in_expression_rejected() {
        let dir = TempDir::new().unwrap();
        let f = file(&dir, "s.json.tera", TemplateKind::Expression, "{{ config.");

        let err = TemplateRenderer::new().render(&f, &namespace()).unwrap_err();
        assert!(matches!(err, TemplateError::Render { .. }));
    }
}
