use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Definition used by [`DeploymentFixture::standard`]
///
/// Stack name `acme-web-test`; `production` carries user-declared
/// parameters for the main document.
pub const STANDARD_DEFINITION: &str = r#"
prefix = "acme"
name = "web"
bucket = "acme-deployments"

[targets.test]
kms_key = "kms-test"

[targets.test.cloudformation.parameters]
InstanceType = "t3.micro"
DesiredCount = 2

[targets.production]
kms_key = "kms-prod"
"#;

/// Opscode table appended by [`DeploymentFixture::with_own_server`]
pub const OWN_SERVER_SETTINGS: &str = r#"
[opscode]
user = "deployer"
server_url = "https://chef.example.com"
organization = "acme"
"#;

/// Main document declaring one reserved and two user parameters
pub const STANDARD_MAIN: &str = r#"{
  "AWSTemplateFormatVersion": "2010-09-09",
  "Parameters": {
    "stackwrightS3Bucket": { "Type": "String" },
    "InstanceType": { "Type": "String" },
    "DesiredCount": { "Type": "Number" }
  },
  "Resources": {}
}"#;

/// A deployment directory plus a scratch directory, both temporary
#[derive(Debug)]
pub struct DeploymentFixture {
    dir: TempDir,
    scratch: TempDir,
}

impl DeploymentFixture {
    /// Empty deployment directory holding only `definition`
    pub fn new(definition: &str) -> Self {
        let fixture = Self {
            dir: TempDir::new().expect("create deployment dir"),
            scratch: TempDir::new().expect("create scratch dir"),
        };
        fixture.write("stackwright.toml", definition);
        fixture
    }

    /// [`STANDARD_DEFINITION`] with [`STANDARD_MAIN`] as the only template
    pub fn standard() -> Self {
        Self::new(STANDARD_DEFINITION).with_template("main.json", STANDARD_MAIN)
    }

    /// Standard fixture whose deployment runs its own server
    pub fn with_own_server() -> Self {
        Self::new(&format!("{STANDARD_DEFINITION}{OWN_SERVER_SETTINGS}"))
            .with_template("main.json", STANDARD_MAIN)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn scratch(&self) -> &Path {
        self.scratch.path()
    }

    /// Write `content` at `relative`, creating parent directories
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture parent");
        }
        std::fs::write(&path, content).expect("write fixture file");
        path
    }

    pub fn with_template(self, relative: &str, content: &str) -> Self {
        self.write(&format!("cloudformation/{relative}"), content);
        self
    }

    /// Parameter file under `config/{target}/`
    pub fn with_parameters(self, target: &str, file: &str, content: &str) -> Self {
        self.write(&format!("config/{target}/{file}"), content);
        self
    }

    /// Server definition directory under `opscode/`
    pub fn with_server(self, name: &str) -> Self {
        self.write(&format!("opscode/{name}/Berksfile"), "source 'https://supermarket.chef.io'\n");
        self.write(&format!("opscode/{name}/environment.json"), "{}\n");
        self
    }

    /// Node-fleet directory under `opsworks/`
    pub fn with_fleet(self, name: &str) -> Self {
        self.write(&format!("opsworks/{name}/Berksfile"), "source 'https://supermarket.chef.io'\n");
        self.write(&format!("opsworks/{name}/metadata.rb"), &format!("name '{name}'\n"));
        self
    }

    /// Remove the `cloudformation/` directory
    pub fn without_templates(self) -> Self {
        let dir = self.dir.path().join("cloudformation");
        if dir.exists() {
            std::fs::remove_dir_all(dir).expect("remove templates");
        }
        self
    }
}
