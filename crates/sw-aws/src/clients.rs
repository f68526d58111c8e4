//! Client construction
//!
//! Both service clients are built from one shared SDK configuration.

use std::fmt;
use std::path::Path;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use serde::Deserialize;
use tracing::debug;

/// Static credentials file (`credentials.json`)
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsCredentials {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("failed to read credentials {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid credentials {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl AwsCredentials {
    /// Read a credentials file
    ///
    /// # Errors
    /// - `CredentialsError::Io` if the file cannot be read
    /// - `CredentialsError::Parse` if it lacks a field
    pub fn load(path: &Path) -> Result<Self, CredentialsError> {
        let text = std::fs::read_to_string(path).map_err(|source| CredentialsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CredentialsError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Service clients sharing one region and credential source
#[derive(Debug, Clone)]
pub struct AwsClients {
    pub s3: aws_sdk_s3::Client,
    pub cloudformation: aws_sdk_cloudformation::Client,
    region: String,
}

impl AwsClients {
    /// Clients using static credentials
    pub async fn connect(credentials: &AwsCredentials) -> Self {
        let provider = aws_sdk_s3::config::Credentials::new(
            &credentials.access_key_id,
            &credentials.secret_access_key,
            None,
            None,
            "stackwright-credentials-file",
        );
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(credentials.region.clone()))
            .credentials_provider(provider)
            .load()
            .await;
        debug!(region = %credentials.region, "connected with static credentials");
        Self::from_config(&config, &credentials.region)
    }

    /// Clients using the default credential chain
    pub async fn from_environment(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        debug!(region, "connected with default credential chain");
        Self::from_config(&config, region)
    }

    fn from_config(config: &SdkConfig, region: &str) -> Self {
        Self {
            s3: aws_sdk_s3::Client::new(config),
            cloudformation: aws_sdk_cloudformation::Client::new(config),
            region: region.to_string(),
        }
    }

    #[inline]
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn load_credentials_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(
            &path,
            r#"{"region": "eu-west-1", "accessKeyId": "AKIA123", "secretAccessKey": "s3cr3t"}"#,
        )
        .unwrap();

        let credentials = AwsCredentials::load(&path).unwrap();
        assert_eq!(credentials.region, "eu-west-1");
        assert_eq!(credentials.access_key_id, "AKIA123");
        assert!(!format!("{credentials:?}").contains("s3cr3t"));
    }

    #[test]
    fn missing_field_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, r#"{"region": "eu-west-1"}"#).unwrap();

        assert!(matches!(AwsCredentials::load(&path), Err(CredentialsError::Parse { .. })));
    }

    #[tokio::test]
    async fn connect_uses_configured_region() {
        let credentials = AwsCredentials {
            region: "ap-southeast-2".to_string(),
            access_key_id: "AKIA123".to_string(),
            secret_access_key: "secret".to_string(),
        };
        let clients = AwsClients::connect(&credentials).await;
        assert_eq!(clients.region(), "ap-southeast-2");
        assert_eq!(
            clients.s3.config().region().map(|r| r.as_ref().to_string()),
            Some("ap-southeast-2".to_string())
        );
    }
}
