//! Stackwright CLI - deploy and render infrastructure stacks.

mod commands;
mod logging;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use sw_core::DeployError;

use crate::logging::LogFormat;

#[derive(Parser)]
#[command(name = "stackwright")]
#[command(about = "Render, publish and reconcile infrastructure stacks")]
#[command(version)]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    /// Deployer settings (directory names, main document, expression suffix)
    #[arg(long, global = true)]
    deployer_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a deployment directory to a target
    Deploy {
        /// Deployment directory containing stackwright.toml
        dir: PathBuf,

        /// Target to deploy, e.g. production
        target: String,

        /// Credentials file (defaults to DIR/credentials.json)
        #[arg(long)]
        credentials: Option<PathBuf>,

        /// Region, when using the default credential chain
        #[arg(long)]
        region: Option<String>,

        /// Path of the berks executable
        #[arg(long, default_value = "berks")]
        berks: PathBuf,

        /// Path of the knife executable
        #[arg(long, default_value = "knife")]
        knife: PathBuf,
    },

    /// Render templates locally without validating or publishing
    Render {
        /// Deployment directory containing stackwright.toml
        dir: PathBuf,

        /// Target to render for
        target: String,

        /// Directory receiving the rendered documents
        #[arg(short, long)]
        out: PathBuf,

        /// Region recorded in the namespace
        #[arg(long, default_value = "us-east-1")]
        region: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_format);

    let result = match commands::load_deployer_config(cli.deployer_config.as_deref()) {
        Ok(config) => match cli.command {
            Commands::Deploy {
                dir,
                target,
                credentials,
                region,
                berks,
                knife,
            } => {
                let args = commands::deploy::DeployArgs {
                    dir,
                    target,
                    credentials,
                    region,
                    berks,
                    knife,
                };
                commands::deploy::run(args, config).await
            }
            Commands::Render {
                dir,
                target,
                out,
                region,
            } => commands::render::run(&dir, &target, &region, &out, &config),
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code(&e));
    }
}

/// 2 when the deployment directory needs fixing, 1 for everything else
fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<DeployError>() {
        Some(e) if e.is_input_error() => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use sw_core::ProvisioningError;

    #[test]
    fn input_errors_exit_with_two() {
        let err = Err::<(), _>(DeployError::MissingParameter("InstanceType".to_string()))
            .context("deploying web to production")
            .unwrap_err();
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn service_errors_exit_with_one() {
        let err = anyhow::Error::from(DeployError::Provisioning(ProvisioningError::Service {
            code: "Throttling".to_string(),
            message: "Rate exceeded".to_string(),
        }));
        assert_eq!(exit_code(&err), 1);
        assert_eq!(exit_code(&anyhow::anyhow!("no credentials")), 1);
    }
}
