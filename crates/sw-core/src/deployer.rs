//! Deployment run sequencing
//!
//! A run is strictly sequential:
//! 1. publish the serialized namespace, encrypted under the target's key
//! 2. `opscode/` present: bootstrap or register configuration-management servers
//! 3. `opsworks/` present: publish node-fleet archives
//! 4. `cloudformation/` present: render/validate/publish templates, resolve
//!    parameters, reconcile the stack
//!
//! Without `cloudformation/` the run ends after step 3 with
//! [`DeployOutcome::Skipped`].

use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sw_model::{
    ConfigurationNamespace, DeploymentDefinition, StackName, StorageLocation, TargetParameters,
};
use sw_template::{TemplateSettings, TemplateSource};
use tracing::{error, info, info_span, Instrument};
use ulid::Ulid;

use crate::assembler::assemble;
use crate::bootstrap::{self, BootstrapDecision};
use crate::collaborators::Collaborators;
use crate::error::{DeployError, DeployResult};
use crate::fleet::publish_fleet;
use crate::pipeline::publish_templates;
use crate::reconciler::{ReconcileOutcome, StackReconciler};
use crate::resolver::resolve;

/// Identifier of one deployment run, attached to its tracing span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunId(Ulid);

impl RunId {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Directory and file naming of a deployment directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployerConfig {
    pub cloudformation_dir: String,
    pub opsworks_dir: String,
    pub opscode_dir: String,
    pub config_dir: String,
    /// Relative path of the main document
    pub main_document: String,
    /// Suffix marking expression templates, without the dot
    pub expression_marker: String,
}

impl Default for DeployerConfig {
    fn default() -> Self {
        let templates = TemplateSettings::default();
        Self {
            cloudformation_dir: "cloudformation".to_string(),
            opsworks_dir: "opsworks".to_string(),
            opscode_dir: "opscode".to_string(),
            config_dir: "config".to_string(),
            main_document: templates.main_document,
            expression_marker: templates.expression_marker,
        }
    }
}

impl DeployerConfig {
    #[must_use]
    pub fn with_main_document(mut self, name: impl Into<String>) -> Self {
        self.main_document = name.into();
        self
    }

    #[must_use]
    pub fn with_expression_marker(mut self, marker: impl Into<String>) -> Self {
        self.expression_marker = marker.into();
        self
    }

    #[must_use]
    pub fn with_config_dir(mut self, dir: impl Into<String>) -> Self {
        self.config_dir = dir.into();
        self
    }

    #[must_use]
    pub fn template_settings(&self) -> TemplateSettings {
        TemplateSettings {
            main_document: self.main_document.clone(),
            expression_marker: self.expression_marker.clone(),
        }
    }
}

/// A deployment directory loaded for one target
///
/// Everything a run needs that does not touch a collaborator.
#[derive(Debug, Clone)]
pub struct DeploymentContext {
    pub dir: PathBuf,
    pub definition: DeploymentDefinition,
    pub namespace: ConfigurationNamespace,
}

impl DeploymentContext {
    /// Load the definition and target parameters and assemble the namespace
    ///
    /// # Errors
    /// - `DeployError::Model` if the definition or parameters are invalid or
    ///   the target is not declared
    pub fn load(dir: &Path, target: &str, region: &str, config: &DeployerConfig) -> DeployResult<Self> {
        let definition = DeploymentDefinition::load(dir)?;
        let identity = definition.identity(target)?;
        let keys = definition.encryption_keys(target)?;
        let storage = StorageLocation::new(&definition.bucket, region);
        let parameters = TargetParameters::load(&dir.join(&config.config_dir), target)?;

        let namespace = assemble(&identity, &storage, &keys, parameters);
        Ok(Self {
            dir: dir.to_path_buf(),
            definition,
            namespace,
        })
    }

    #[inline]
    #[must_use]
    pub fn stack_name(&self) -> StackName {
        self.namespace.stack_name()
    }

    /// `dir/name` if it is a directory
    #[must_use]
    pub fn source_dir(&self, name: &str) -> Option<PathBuf> {
        let path = self.dir.join(name);
        path.is_dir().then_some(path)
    }
}

/// How the stack step of a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployOutcome {
    /// Stack created, updated or already current
    Reconciled(ReconcileOutcome),
    /// No `cloudformation/` directory
    Skipped,
}

impl fmt::Display for DeployOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reconciled(outcome) => fmt::Display::fmt(outcome, f),
            Self::Skipped => f.write_str("SKIPPED"),
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub run_id: RunId,
    pub stack: StackName,
    /// Key of the published namespace
    pub config_key: String,
    pub bootstrap: Option<BootstrapDecision>,
    /// Keys of published server cookbook archives (bootstrap path)
    pub server_archives: Vec<String>,
    /// Environments registered (steady-state path)
    pub environments: Vec<String>,
    pub fleet_archives: Vec<String>,
    pub templates: Vec<String>,
    pub outcome: DeployOutcome,
}

impl DeployReport {
    fn new(run_id: RunId, namespace: &ConfigurationNamespace) -> Self {
        Self {
            run_id,
            stack: namespace.stack_name(),
            config_key: namespace.keys().config().to_string(),
            bootstrap: None,
            server_archives: Vec::new(),
            environments: Vec::new(),
            fleet_archives: Vec::new(),
            templates: Vec::new(),
            outcome: DeployOutcome::Skipped,
        }
    }
}

/// Runs deployments against one set of collaborators
#[derive(Debug, Clone)]
pub struct Deployer {
    collaborators: Collaborators,
    config: DeployerConfig,
}

impl Deployer {
    #[must_use]
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            collaborators,
            config: DeployerConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: DeployerConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &DeployerConfig {
        &self.config
    }

    /// Deploy `dir` to `target`
    ///
    /// `scratch` receives vendored definitions and is owned by the caller.
    ///
    /// # Errors
    /// The first unrecovered error of any step. Artifacts published before it
    /// are left in place.
    pub async fn deploy(
        &self,
        dir: &Path,
        target: &str,
        region: &str,
        scratch: &Path,
    ) -> DeployResult<DeployReport> {
        let context = DeploymentContext::load(dir, target, region, &self.config)?;
        self.deploy_context(&context, scratch).await
    }

    /// Deploy an already loaded context
    ///
    /// # Errors
    /// See [`Self::deploy`].
    pub async fn deploy_context(&self, context: &DeploymentContext, scratch: &Path) -> DeployResult<DeployReport> {
        let run_id = RunId::new();
        let stack = context.stack_name();
        let span = info_span!("deploy", run_id = %run_id, stack = %stack);

        async {
            info!(deploy_target = %context.namespace.identity().target, "starting deployment");
            match self.run(run_id, context, scratch).await {
                Ok(report) => {
                    info!(outcome = %report.outcome, "deployment finished");
                    Ok(report)
                }
                Err(e) => {
                    error!(error = %e, "deployment failed");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(&self, run_id: RunId, context: &DeploymentContext, scratch: &Path) -> DeployResult<DeployReport> {
        let namespace = &context.namespace;
        let mut report = DeployReport::new(run_id, namespace);

        self.publish_namespace(namespace).await?;

        if let Some(server_dir) = context.source_dir(&self.config.opscode_dir) {
            self.configure_servers(context, &server_dir, scratch, &mut report).await?;
        }

        if let Some(fleet_dir) = context.source_dir(&self.config.opsworks_dir) {
            report.fleet_archives = publish_fleet(
                &fleet_dir,
                scratch,
                namespace,
                self.collaborators.packager.as_ref(),
                self.collaborators.blob_store.as_ref(),
            )
            .await?;
        }

        let Some(template_dir) = context.source_dir(&self.config.cloudformation_dir) else {
            info!("no cloudformation directory, skipping stack");
            return Ok(report);
        };

        let source = TemplateSource::new(template_dir, self.config.template_settings());
        let published = publish_templates(
            &source,
            namespace,
            self.collaborators.provisioning.as_ref(),
            self.collaborators.blob_store.as_ref(),
        )
        .await?;

        let stack_config = context.definition.stack_config(&namespace.identity().target);
        let parameters = resolve(published.main.parameters(), namespace, stack_config)?;

        let mut reconciler = StackReconciler::new(self.collaborators.provisioning.as_ref());
        let outcome = reconciler
            .reconcile(&report.stack, &published.template_url, parameters)
            .await?;

        report.templates = published.keys;
        report.outcome = DeployOutcome::Reconciled(outcome);
        Ok(report)
    }

    async fn publish_namespace(&self, namespace: &ConfigurationNamespace) -> DeployResult<()> {
        let body = namespace
            .to_pretty_json()
            .map_err(|e| DeployError::Serialization(e.to_string()))?;
        let key = namespace.keys().config();
        self.collaborators
            .blob_store
            .put(namespace.bucket(), key, Bytes::from(body), Some(namespace.kms_key()))
            .await?;
        info!(key = %key, "published configuration");
        Ok(())
    }

    async fn configure_servers(
        &self,
        context: &DeploymentContext,
        server_dir: &Path,
        scratch: &Path,
        report: &mut DeployReport,
    ) -> DeployResult<()> {
        let settings = context
            .definition
            .opscode
            .as_ref()
            .ok_or(DeployError::MissingOpscodeSettings)?;
        let namespace = &context.namespace;

        let decision = bootstrap::decide(namespace, settings, self.collaborators.provisioning.as_ref()).await?;
        info!(decision = ?decision, "configuration management");
        report.bootstrap = Some(decision);

        match decision {
            BootstrapDecision::Bootstrap => {
                report.server_archives = bootstrap::publish_server_cookbooks(
                    server_dir,
                    scratch,
                    namespace,
                    self.collaborators.packager.as_ref(),
                    self.collaborators.blob_store.as_ref(),
                )
                .await?;
            }
            BootstrapDecision::SteadyState => {
                report.environments = bootstrap::register_servers(
                    server_dir,
                    namespace,
                    settings,
                    self.collaborators.config_management.as_ref(),
                    self.collaborators.blob_store.as_ref(),
                )
                .await?;
            }
        }
        Ok(())
    }
}
