use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sw_core::{BoxError, ConfigManagement, ConfigManagementSession, ServerCredentials, ToolResult};

/// Something a [`RecordingConfigManagement`] session was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEvent {
    Connected { user: String, user_key: String },
    EnvironmentCreated(String),
    Uploaded { dir: PathBuf, environment: String },
    Released,
}

#[derive(Debug, Default)]
struct Shared {
    events: Mutex<Vec<ConfigEvent>>,
    fail_upload: Mutex<Option<String>>,
}

/// Configuration-management client recording every session event
#[derive(Debug, Clone, Default)]
pub struct RecordingConfigManagement {
    shared: Arc<Shared>,
}

impl RecordingConfigManagement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail uploads into `environment`
    pub fn fail_upload_to(&self, environment: &str) {
        *self.shared.fail_upload.lock() = Some(environment.to_string());
    }

    pub fn events(&self) -> Vec<ConfigEvent> {
        self.shared.events.lock().clone()
    }

    pub fn environments(&self) -> Vec<String> {
        self.shared
            .events
            .lock()
            .iter()
            .filter_map(|event| match event {
                ConfigEvent::EnvironmentCreated(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn was_released(&self) -> bool {
        self.shared.events.lock().contains(&ConfigEvent::Released)
    }
}

struct RecordingSession {
    shared: Arc<Shared>,
}

#[async_trait]
impl ConfigManagement for RecordingConfigManagement {
    async fn connect(&self, credentials: ServerCredentials) -> ToolResult<Box<dyn ConfigManagementSession>> {
        self.shared.events.lock().push(ConfigEvent::Connected {
            user: credentials.user,
            user_key: credentials.user_key,
        });
        Ok(Box::new(RecordingSession {
            shared: Arc::clone(&self.shared),
        }))
    }
}

#[async_trait]
impl ConfigManagementSession for RecordingSession {
    async fn create_environment(&mut self, name: &str) -> ToolResult<()> {
        self.shared
            .events
            .lock()
            .push(ConfigEvent::EnvironmentCreated(name.to_string()));
        Ok(())
    }

    async fn upload_definitions(&mut self, dir: &Path, environment: &str) -> ToolResult<()> {
        self.shared.events.lock().push(ConfigEvent::Uploaded {
            dir: dir.to_path_buf(),
            environment: environment.to_string(),
        });
        if self.shared.fail_upload.lock().as_deref() == Some(environment) {
            return Err(BoxError::from(format!("upload to {environment} refused")));
        }
        Ok(())
    }

    async fn release(self: Box<Self>) -> ToolResult<()> {
        self.shared.events.lock().push(ConfigEvent::Released);
        Ok(())
    }
}
