//! Configuration namespace
//!
//! One flat key/value namespace per deployment run. Reserved keys (all
//! beginning with [`RESERVED_PREFIX`]) are computed from the deployment
//! identity; every other key comes from the target parameters. Templates are
//! rendered against it, the main document's reserved parameters are filled
//! from it, and it is published as the deployment's configuration object.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::fmt;

use crate::error::{ModelError, ModelResult};
use crate::identity::{EncryptionKeyId, StackIdentity, StackName, StorageLocation};
use crate::target_params::TargetParameters;

/// Prefix shared by every reserved key
pub const RESERVED_PREFIX: &str = "stackwright";

/// Keys the namespace always carries and that user configuration may not set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReservedKey {
    Name,
    Target,
    Prefix,
    S3Bucket,
    Region,
    KmsKey,
    ConfigS3Key,
    CloudformationS3Key,
    OpsworksS3Key,
    OpscodeS3Key,
}

impl ReservedKey {
    /// Every reserved key in serialization order
    pub const ALL: [ReservedKey; 10] = [
        ReservedKey::Name,
        ReservedKey::Target,
        ReservedKey::Prefix,
        ReservedKey::S3Bucket,
        ReservedKey::Region,
        ReservedKey::KmsKey,
        ReservedKey::ConfigS3Key,
        ReservedKey::CloudformationS3Key,
        ReservedKey::OpsworksS3Key,
        ReservedKey::OpscodeS3Key,
    ];

    /// Key as it appears in the namespace and in template parameters
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ReservedKey::Name => "stackwrightName",
            ReservedKey::Target => "stackwrightTarget",
            ReservedKey::Prefix => "stackwrightPrefix",
            ReservedKey::S3Bucket => "stackwrightS3Bucket",
            ReservedKey::Region => "stackwrightRegion",
            ReservedKey::KmsKey => "stackwrightKmsKey",
            ReservedKey::ConfigS3Key => "stackwrightConfigS3Key",
            ReservedKey::CloudformationS3Key => "stackwrightCloudformationS3Key",
            ReservedKey::OpsworksS3Key => "stackwrightOpsworksS3Key",
            ReservedKey::OpscodeS3Key => "stackwrightOpscodeS3Key",
        }
    }

    /// Look up a reserved key by name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }

    /// Whether a user-supplied key collides with the reserved prefix
    #[inline]
    #[must_use]
    pub fn is_reserved_name(name: &str) -> bool {
        name.starts_with(RESERVED_PREFIX)
    }
}

impl fmt::Display for ReservedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Blob-storage key prefixes of one deployment, rooted at `{target}/{name}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    config: String,
    cloudformation: String,
    opsworks: String,
    opscode: String,
}

impl KeyLayout {
    #[must_use]
    pub fn for_deployment(target: &str, name: &str) -> Self {
        let root = format!("{target}/{name}");
        Self {
            config: format!("{root}/config.json"),
            cloudformation: format!("{root}/cloudformation"),
            opsworks: format!("{root}/opsworks"),
            opscode: format!("{root}/opscode"),
        }
    }

    /// Key of the serialized namespace
    #[inline]
    #[must_use]
    pub fn config(&self) -> &str {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn cloudformation(&self) -> &str {
        &self.cloudformation
    }

    #[inline]
    #[must_use]
    pub fn opsworks(&self) -> &str {
        &self.opsworks
    }

    #[inline]
    #[must_use]
    pub fn opscode(&self) -> &str {
        &self.opscode
    }

    /// `{cloudformation}/{relative}`
    #[must_use]
    pub fn template(&self, relative_path: &str) -> String {
        format!("{}/{relative_path}", self.cloudformation)
    }

    /// `{opsworks}/{stack}.tar.gz`
    #[must_use]
    pub fn fleet_archive(&self, stack: &str) -> String {
        format!("{}/{stack}.tar.gz", self.opsworks)
    }

    /// `{opscode}/cookbooks/{server}.tar.gz`
    #[must_use]
    pub fn cookbook_archive(&self, server: &str) -> String {
        format!("{}/cookbooks/{server}.tar.gz", self.opscode)
    }

    /// `{opscode}/keys/{user}.pem`
    #[must_use]
    pub fn user_key(&self, user: &str) -> String {
        format!("{}/keys/{user}.pem", self.opscode)
    }
}

/// Flat configuration namespace of one deployment run
///
/// Immutable once built. Serializes to a single JSON object with the
/// reserved keys first, followed by the target parameters in load order.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationNamespace {
    identity: StackIdentity,
    storage: StorageLocation,
    kms_key: EncryptionKeyId,
    keys: KeyLayout,
    parameters: TargetParameters,
}

impl ConfigurationNamespace {
    /// Build the namespace
    ///
    /// `parameters` have already been checked against the reserved prefix,
    /// so construction cannot fail.
    #[must_use]
    pub fn new(
        identity: StackIdentity,
        storage: StorageLocation,
        kms_key: EncryptionKeyId,
        parameters: TargetParameters,
    ) -> Self {
        let keys = KeyLayout::for_deployment(&identity.target, &identity.name);
        Self {
            identity,
            storage,
            kms_key,
            keys,
            parameters,
        }
    }

    /// Value of a reserved key
    #[must_use]
    pub fn reserved(&self, key: ReservedKey) -> &str {
        match key {
            ReservedKey::Name => &self.identity.name,
            ReservedKey::Target => &self.identity.target,
            ReservedKey::Prefix => &self.identity.prefix,
            ReservedKey::S3Bucket => &self.storage.bucket,
            ReservedKey::Region => &self.storage.region,
            ReservedKey::KmsKey => self.kms_key.as_str(),
            ReservedKey::ConfigS3Key => self.keys.config(),
            ReservedKey::CloudformationS3Key => self.keys.cloudformation(),
            ReservedKey::OpsworksS3Key => self.keys.opsworks(),
            ReservedKey::OpscodeS3Key => self.keys.opscode(),
        }
    }

    /// Value of any key, reserved or user-supplied
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        match ReservedKey::from_name(name) {
            Some(key) => Some(Value::String(self.reserved(key).to_string())),
            None => self.parameters.get(name).cloned(),
        }
    }

    #[inline]
    #[must_use]
    pub fn identity(&self) -> &StackIdentity {
        &self.identity
    }

    #[inline]
    #[must_use]
    pub fn storage(&self) -> &StorageLocation {
        &self.storage
    }

    #[inline]
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.storage.bucket
    }

    #[inline]
    #[must_use]
    pub fn kms_key(&self) -> &EncryptionKeyId {
        &self.kms_key
    }

    #[inline]
    #[must_use]
    pub fn keys(&self) -> &KeyLayout {
        &self.keys
    }

    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &TargetParameters {
        &self.parameters
    }

    #[inline]
    #[must_use]
    pub fn stack_name(&self) -> StackName {
        self.identity.stack_name()
    }

    /// Total number of keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        ReservedKey::ALL.len() + self.parameters.len()
    }

    /// Always false: reserved keys are always present
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Pretty-printed JSON form, as published to blob storage
    ///
    /// # Errors
    /// Returns error if a user value cannot be serialized
    pub fn to_pretty_json(&self) -> ModelResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ModelError::Serialization(e.to_string()))
    }
}

impl Serialize for ConfigurationNamespace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for key in ReservedKey::ALL {
            map.serialize_entry(key.as_str(), self.reserved(key))?;
        }
        for (key, value) in self.parameters.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn namespace() -> ConfigurationNamespace {
        let params = TargetParameters::from_map(
            [
                ("instanceType".to_string(), json!("t3.micro")),
                ("replicas".to_string(), json!(3)),
            ]
            .into_iter()
            .collect(),
        )
        .unwrap();

        ConfigurationNamespace::new(
            StackIdentity::new("acme", "web", "production"),
            StorageLocation::new("acme-deployments", "eu-west-1"),
            EncryptionKeyId::new("key-prod"),
            params,
        )
    }

    #[test]
    fn reserved_key_names_share_prefix() {
        for key in ReservedKey::ALL {
            assert!(key.as_str().starts_with(RESERVED_PREFIX), "{key}");
            assert_eq!(ReservedKey::from_name(key.as_str()), Some(key));
        }
        assert_eq!(ReservedKey::from_name("InstanceType"), None);
    }

    #[test]
    fn key_layout_is_rooted_at_target_and_name() {
        let layout = KeyLayout::for_deployment("production", "web");
        assert_eq!(layout.config(), "production/web/config.json");
        assert_eq!(layout.template("nested/vpc.json"), "production/web/cloudformation/nested/vpc.json");
        assert_eq!(layout.fleet_archive("app"), "production/web/opsworks/app.tar.gz");
        assert_eq!(layout.cookbook_archive("chef"), "production/web/opscode/cookbooks/chef.tar.gz");
        assert_eq!(layout.user_key("deployer"), "production/web/opscode/keys/deployer.pem");
    }

    #[test]
    fn reserved_values_come_from_identity() {
        let ns = namespace();
        assert_eq!(ns.reserved(ReservedKey::Name), "web");
        assert_eq!(ns.reserved(ReservedKey::Target), "production");
        assert_eq!(ns.reserved(ReservedKey::Prefix), "acme");
        assert_eq!(ns.reserved(ReservedKey::S3Bucket), "acme-deployments");
        assert_eq!(ns.reserved(ReservedKey::Region), "eu-west-1");
        assert_eq!(ns.reserved(ReservedKey::KmsKey), "key-prod");
        assert_eq!(
            ns.reserved(ReservedKey::CloudformationS3Key),
            "production/web/cloudformation"
        );
    }

    #[test]
    fn serializes_flat_with_reserved_keys_first() {
        let value = serde_json::to_value(namespace()).unwrap();
        let object = value.as_object().unwrap();

        let keys: Vec<_> = object.keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 12);
        assert_eq!(keys[0], "stackwrightName");
        assert_eq!(&keys[10..], &["instanceType", "replicas"]);
        assert_eq!(object["replicas"], json!(3));
        assert_eq!(object["stackwrightOpsworksS3Key"], json!("production/web/opsworks"));
    }

    #[test]
    fn get_covers_both_key_kinds() {
        let ns = namespace();
        assert_eq!(ns.get("stackwrightTarget"), Some(json!("production")));
        assert_eq!(ns.get("instanceType"), Some(json!("t3.micro")));
        assert_eq!(ns.get("missing"), None);
    }
}
