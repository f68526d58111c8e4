//! Stackwright Template Layer
//!
//! The boundary between the template source tree on disk and the documents
//! handed to the provisioning service.
//!
//! # Core Operations
//!
//! - **Discovery**: walk the source tree and classify each file as static
//!   (`*.json`) or expression template (`*.json.tera`)
//! - **Render**: read static files verbatim, evaluate expression templates
//!   with the configuration namespace bound as `config`
//! - **Main document**: parse the entry-point document and extract its
//!   declared parameter names in order
//!
//! # Architecture
//!
//! ```text
//! cloudformation/ → TemplateSource → TemplateFile → TemplateRenderer → TemplateDocument
//!                                                                          ↓
//!                                                                    MainDocument
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use sw_template::{render_tree, TemplateSettings};
//!
//! let (documents, main) = render_tree(&dir.join("cloudformation"), &namespace, &TemplateSettings::default())?;
//! println!("{} documents, main declares {:?}", documents.len(), main.parameters());
//! ```

#![allow(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod discovery;
pub mod document;
pub mod error;
pub mod main_document;
pub mod renderer;

// Re-exports for convenience
pub use discovery::{TemplateSettings, TemplateSource};
pub use document::{TemplateDocument, TemplateFile, TemplateKind};
pub use error::{TemplateError, TemplateResult};
pub use main_document::MainDocument;
pub use renderer::TemplateRenderer;

use std::path::Path;
use sw_model::ConfigurationNamespace;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Render a whole source tree without side effects
///
/// Returns every document in processing order plus the parsed main document.
///
/// # Errors
/// - `TemplateError::Render` if an expression template fails or renders invalid JSON
/// - `TemplateError::MainDocumentMissing` if no document is the main document
pub fn render_tree(
    root: &Path,
    namespace: &ConfigurationNamespace,
    settings: &TemplateSettings,
) -> TemplateResult<(Vec<TemplateDocument>, MainDocument)> {
    let source = TemplateSource::new(root, settings.clone());
    let renderer = TemplateRenderer::new();

    let mut documents = Vec::new();
    let mut main = None;
    for file in source.discover()? {
        let document = renderer.render(&file, namespace)?;
        if document.is_main {
            main = Some(MainDocument::parse(&document)?);
        }
        documents.push(document);
    }

    let main = main.ok_or_else(|| TemplateError::MainDocumentMissing(settings.main_document.clone()))?;
    Ok((documents, main))
}
