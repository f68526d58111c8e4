//! Configuration Assembler
//!
//! Builds the namespace every later step reads from. Pure: the target
//! parameters were validated against the reserved prefix when loaded.

use sw_model::{ConfigurationNamespace, EncryptionKeys, StackIdentity, StorageLocation, TargetParameters};

/// Assemble the configuration namespace of one run
#[must_use]
pub fn assemble(
    identity: &StackIdentity,
    storage: &StorageLocation,
    keys: &EncryptionKeys,
    parameters: TargetParameters,
) -> ConfigurationNamespace {
    ConfigurationNamespace::new(
        identity.clone(),
        storage.clone(),
        keys.active().clone(),
        parameters,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use sw_model::{EncryptionKeyId, ReservedKey};

    fn keys() -> EncryptionKeys {
        let mut keys = IndexMap::new();
        keys.insert("test".to_string(), EncryptionKeyId::new("key-test"));
        keys.insert("production".to_string(), EncryptionKeyId::new("key-prod"));
        EncryptionKeys::select(keys, "production").unwrap()
    }

    #[test]
    fn reserved_keys_populated() {
        let namespace = assemble(
            &StackIdentity::new("acme", "web", "production"),
            &StorageLocation::new("acme-deployments", "eu-west-1"),
            &keys(),
            TargetParameters::default(),
        );

        let expected = [
            (ReservedKey::Name, "web"),
            (ReservedKey::Target, "production"),
            (ReservedKey::Prefix, "acme"),
            (ReservedKey::S3Bucket, "acme-deployments"),
            (ReservedKey::Region, "eu-west-1"),
            (ReservedKey::KmsKey, "key-prod"),
            (ReservedKey::ConfigS3Key, "production/web/config.json"),
            (ReservedKey::CloudformationS3Key, "production/web/cloudformation"),
            (ReservedKey::OpsworksS3Key, "production/web/opsworks"),
            (ReservedKey::OpscodeS3Key, "production/web/opscode"),
        ];
        for (key, value) in expected {
            assert_eq!(namespace.reserved(key), value, "{key}");
        }
    }

    #[test]
    fn serialized_form_lists_reserved_then_user_keys() {
        let mut values = IndexMap::new();
        values.insert("zone".to_string(), json!("a"));
        values.insert("count".to_string(), json!(2));

        let namespace = assemble(
            &StackIdentity::new("acme", "web", "production"),
            &StorageLocation::new("b", "r"),
            &keys(),
            TargetParameters::from_map(values).unwrap(),
        );

        let value: Value = serde_json::from_str(&namespace.to_pretty_json().unwrap()).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 12);
        assert_eq!(keys[0], "stackwrightName");
        assert_eq!(&keys[10..], ["zone", "count"]);
    }
}
