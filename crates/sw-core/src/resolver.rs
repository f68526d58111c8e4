//! Parameter Resolver
//!
//! Turns the main document's declared parameter names into name/value
//! pairs. Reserved names are answered by the namespace alone; every other
//! name is answered by the target's stack configuration alone.

use std::collections::HashSet;

use sw_model::{ConfigurationNamespace, ParameterDeclaration, ReservedKey, StackConfig};
use tracing::debug;

use crate::error::{DeployError, DeployResult};

/// Resolve declared parameters in declaration order
///
/// # Errors
/// - `DeployError::DuplicateParameter` if a name is declared twice
/// - `DeployError::MissingParameter` if a user-declared name has no value
pub fn resolve(
    declared: &[String],
    namespace: &ConfigurationNamespace,
    stack_config: Option<&StackConfig>,
) -> DeployResult<Vec<ParameterDeclaration>> {
    let mut seen = HashSet::with_capacity(declared.len());
    if let Some(name) = declared.iter().find(|name| !seen.insert(name.as_str())) {
        return Err(DeployError::DuplicateParameter(name.clone()));
    }

    let resolved = declared
        .iter()
        .map(|name| match ReservedKey::from_name(name) {
            Some(key) => Ok(ParameterDeclaration::reserved(name, namespace.reserved(key))),
            None => stack_config
                .and_then(|config| config.parameter(name))
                .map(|value| ParameterDeclaration::user_declared(name, value))
                .ok_or_else(|| DeployError::MissingParameter(name.clone())),
        })
        .collect::<DeployResult<Vec<_>>>()?;

    debug!(count = resolved.len(), "resolved parameters");
    Ok(resolved)
}
