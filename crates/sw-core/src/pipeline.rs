//! Template Rendering Pipeline
//!
//! Each document goes render → validate → publish before the next one is
//! touched, so a failure leaves every later document unpublished.

use bytes::Bytes;
use sw_model::ConfigurationNamespace;
use sw_template::{MainDocument, TemplateRenderer, TemplateSource};
use tracing::{debug, info};

use crate::collaborators::{BlobStore, ProvisioningService};
use crate::error::{DeployError, DeployResult};
use crate::provisioning::ProvisioningError;

/// Result of a completed pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedTemplates {
    /// Blob keys written, in processing order
    pub keys: Vec<String>,
    pub main: MainDocument,
    /// URL of the published main document
    pub template_url: String,
}

/// Render, validate and publish every template under `source`
///
/// # Errors
/// - `DeployError::TemplateRender` if a document fails to render or parse
/// - `DeployError::TemplateValidation` if the service rejects a document,
///   including a static document that is not well-formed JSON
/// - `DeployError::MainDocumentMissing` if no document is the main document
/// - `DeployError::Provisioning` / `DeployError::Storage` on transport failures
pub async fn publish_templates(
    source: &TemplateSource,
    namespace: &ConfigurationNamespace,
    provisioning: &dyn ProvisioningService,
    blob_store: &dyn BlobStore,
) -> DeployResult<PublishedTemplates> {
    let renderer = TemplateRenderer::new();
    let mut keys = Vec::new();
    let mut main = None;

    for file in source.discover()? {
        let document = renderer.render(&file, namespace)?;
        if document.is_main {
            main = Some(MainDocument::parse(&document)?);
        }

        provisioning
            .validate_template(&document.content)
            .await
            .map_err(|e| validation_error(&document.relative_path, e))?;
        debug!(path = %document.relative_path, "template validated");

        let key = namespace.keys().template(&document.relative_path);
        blob_store
            .put(namespace.bucket(), &key, Bytes::from(document.content), None)
            .await?;
        info!(path = %document.relative_path, key = %key, "published template");
        keys.push(key);
    }

    let main = main.ok_or_else(|| {
        DeployError::MainDocumentMissing(source.settings().main_document.clone())
    })?;
    let template_url = blob_store.object_url(namespace.bucket(), &namespace.keys().template(main.relative_path()));

    Ok(PublishedTemplates {
        keys,
        main,
        template_url,
    })
}

fn validation_error(path: &str, error: ProvisioningError) -> DeployError {
    match error {
        ProvisioningError::Validation(message) => DeployError::TemplateValidation {
            path: path.to_string(),
            message,
        },
        other => other.into(),
    }
}
