//! Main-document parsing
//!
//! Only the names under the top-level `Parameters` object matter here. They
//! are read straight from the token stream so declaration order and any
//! repeated key survive; a `Map` would silently collapse duplicates.

use std::fmt;

use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::Deserialize;

use crate::document::TemplateDocument;
use crate::error::{TemplateError, TemplateResult};

/// Entry-point document with its declared parameter names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainDocument {
    relative_path: String,
    parameters: Vec<String>,
}

#[derive(Deserialize)]
struct MainTemplate {
    #[serde(rename = "Parameters", default)]
    parameters: DeclaredParameters,
}

#[derive(Default)]
struct DeclaredParameters(Vec<String>);

impl<'de> Deserialize<'de> for DeclaredParameters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeysVisitor;

        impl<'de> Visitor<'de> for KeysVisitor {
            type Value = DeclaredParameters;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of parameter declarations")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut names = Vec::new();
                while let Some(name) = map.next_key::<String>()? {
                    map.next_value::<IgnoredAny>()?;
                    names.push(name);
                }
                Ok(DeclaredParameters(names))
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(DeclaredParameters::default())
            }
        }

        deserializer.deserialize_any(KeysVisitor)
    }
}

impl MainDocument {
    /// Parse the rendered main document
    ///
    /// A missing `Parameters` member declares no parameters.
    ///
    /// # Errors
    /// - `TemplateError::InvalidMainDocument` if the document is not an object
    ///   or `Parameters` is not an object
    pub fn parse(document: &TemplateDocument) -> TemplateResult<Self> {
        let template: MainTemplate = serde_json::from_str(&document.content).map_err(|e| {
            TemplateError::InvalidMainDocument {
                path: document.relative_path.clone(),
                message: e.to_string(),
            }
        })?;

        Ok(Self {
            relative_path: document.relative_path.clone(),
            parameters: template.parameters.0,
        })
    }

    #[inline]
    #[must_use]
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Declared parameter names in document order, duplicates included
    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }
}
