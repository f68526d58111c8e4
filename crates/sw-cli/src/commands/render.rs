//! Implementation of the `stackwright render` command.

use anyhow::Context;
use std::path::Path;
use sw_core::{resolve, DeployError, DeployerConfig, DeploymentContext};
use sw_model::ParameterDeclaration;
use tracing::info;

/// Render every template of `dir` for `target` into `out`
///
/// Returns the main document's resolved parameters.
pub(crate) fn render(
    dir: &Path,
    target: &str,
    region: &str,
    out: &Path,
    config: &DeployerConfig,
) -> anyhow::Result<Vec<ParameterDeclaration>> {
    let context = DeploymentContext::load(dir, target, region, config)?;
    let template_dir = context
        .source_dir(&config.cloudformation_dir)
        .with_context(|| format!("no {} directory in {}", config.cloudformation_dir, dir.display()))?;

    let (documents, main) = sw_template::render_tree(&template_dir, &context.namespace, &config.template_settings())
        .map_err(DeployError::from)?;

    for document in &documents {
        let path = out.join(&document.relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        std::fs::write(&path, &document.content).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %document.relative_path, "rendered");
    }

    let parameters = resolve(main.parameters(), &context.namespace, context.definition.stack_config(target))?;
    Ok(parameters)
}

pub(crate) fn run(dir: &Path, target: &str, region: &str, out: &Path, config: &DeployerConfig) -> anyhow::Result<()> {
    for parameter in render(dir, target, region, out, config)? {
        println!("{} = {}", parameter.name, parameter.value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sw_test_utils::DeploymentFixture;

    #[test]
    fn renders_documents_and_resolves_parameters() {
        let fixture = DeploymentFixture::standard()
            .with_template("nested/bucket.json.tera", r#"{"Name": "{{ config.stackwrightName }}"}"#);
        let out = tempfile::TempDir::new().unwrap();

        let parameters = render(fixture.path(), "test", "eu-west-1", out.path(), &DeployerConfig::default()).unwrap();

        assert_eq!(
            std::fs::read_to_string(out.path().join("nested/bucket.json")).unwrap(),
            r#"{"Name": "web"}"#
        );
        assert!(out.path().join("main.json").is_file());
        let names: Vec<&str> = parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["stackwrightS3Bucket", "InstanceType", "DesiredCount"]);
    }

    #[test]
    fn missing_parameter_fails() {
        let fixture = DeploymentFixture::standard();
        let out = tempfile::TempDir::new().unwrap();

        let err = render(fixture.path(), "production", "eu-west-1", out.path(), &DeployerConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("No value specified for parameter: InstanceType"));
    }

    #[test]
    fn requires_template_directory() {
        let fixture = DeploymentFixture::standard().without_templates();
        let out = tempfile::TempDir::new().unwrap();

        assert!(render(fixture.path(), "test", "eu-west-1", out.path(), &DeployerConfig::default()).is_err());
    }
}
