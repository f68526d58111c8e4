//! Implementation of the `stackwright deploy` command.

use anyhow::{bail, Context};
use std::path::PathBuf;
use std::sync::Arc;
use sw_aws::{AwsClients, AwsCredentials, CloudFormationService, S3BlobStore};
use sw_core::{Collaborators, Deployer, DeployerConfig};
use sw_tooling::{BerksPackager, ChefWorkstation, ToolPaths};
use tracing::info;

/// Credentials file looked up in the deployment directory
pub(crate) const CREDENTIALS_FILE: &str = "credentials.json";

/// Arguments for the deploy command.
pub(crate) struct DeployArgs {
    pub(crate) dir: PathBuf,
    pub(crate) target: String,
    pub(crate) credentials: Option<PathBuf>,
    pub(crate) region: Option<String>,
    pub(crate) berks: PathBuf,
    pub(crate) knife: PathBuf,
}

async fn connect(args: &DeployArgs) -> anyhow::Result<AwsClients> {
    let path = args
        .credentials
        .clone()
        .unwrap_or_else(|| args.dir.join(CREDENTIALS_FILE));

    if path.is_file() {
        let credentials = AwsCredentials::load(&path)?;
        return Ok(AwsClients::connect(&credentials).await);
    }
    if args.credentials.is_some() {
        bail!("credentials file {} not found", path.display());
    }
    match &args.region {
        Some(region) => Ok(AwsClients::from_environment(region).await),
        None => bail!("no {CREDENTIALS_FILE} in {} and no --region given", args.dir.display()),
    }
}

pub(crate) async fn run(args: DeployArgs, config: DeployerConfig) -> anyhow::Result<()> {
    let clients = connect(&args).await?;
    let paths = ToolPaths::default().with_berks(&args.berks).with_knife(&args.knife);

    let collaborators = Collaborators::new(
        Arc::new(S3BlobStore::new(clients.s3.clone())),
        Arc::new(CloudFormationService::new(clients.cloudformation.clone())),
        Arc::new(ChefWorkstation::new(paths.clone())),
        Arc::new(BerksPackager::new(paths)),
    );
    let deployer = Deployer::new(collaborators).with_config(config);

    let scratch = tempfile::Builder::new()
        .prefix("stackwright")
        .tempdir()
        .context("creating scratch directory")?;

    let report = deployer
        .deploy(&args.dir, &args.target, clients.region(), scratch.path())
        .await
        .with_context(|| format!("deploying {} to {}", args.dir.display(), args.target))?;

    info!(
        run_id = %report.run_id,
        templates = report.templates.len(),
        fleet_archives = report.fleet_archives.len(),
        "run complete"
    );
    println!("{}: {}", report.stack, report.outcome);
    Ok(())
}
