use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use sw_core::{
    OnFailure, ProvisioningError, ProvisioningResult, ProvisioningService, StackRequest,
};
use sw_model::{StackName, StackState, StackStatus};

/// A call received by [`ScriptedProvisioner`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningCall {
    Validate(String),
    Describe(String),
    Create { stack: String, on_failure: OnFailure },
    Update(String),
}

#[derive(Debug, Clone)]
struct StackRecord {
    status: StackStatus,
    request: Option<StackRequest>,
}

/// Stateful provisioning service
///
/// Creating an existing stack fails with "already exists"; updating with an
/// identical request fails with "no changes". Templates that are not JSON are
/// rejected as the real service rejects them. Errors can be queued to
/// override the next create or update.
#[derive(Debug, Default)]
pub struct ScriptedProvisioner {
    stacks: Mutex<HashMap<String, StackRecord>>,
    calls: Mutex<Vec<ProvisioningCall>>,
    create_errors: Mutex<VecDeque<ProvisioningError>>,
    update_errors: Mutex<VecDeque<ProvisioningError>>,
    reject_marker: Mutex<Option<String>>,
}

impl ScriptedProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend a stack already exists with `status`
    pub fn with_stack(self, name: &str, status: &str) -> Self {
        self.stacks.lock().insert(
            name.to_string(),
            StackRecord {
                status: StackStatus::new(status),
                request: None,
            },
        );
        self
    }

    /// Reject any template whose body contains `marker`
    pub fn rejecting_templates_containing(self, marker: &str) -> Self {
        *self.reject_marker.lock() = Some(marker.to_string());
        self
    }

    pub fn fail_next_create(&self, error: ProvisioningError) {
        self.create_errors.lock().push_back(error);
    }

    pub fn fail_next_update(&self, error: ProvisioningError) {
        self.update_errors.lock().push_back(error);
    }

    pub fn calls(&self) -> Vec<ProvisioningCall> {
        self.calls.lock().clone()
    }

    pub fn create_count(&self) -> usize {
        self.count(|call| matches!(call, ProvisioningCall::Create { .. }))
    }

    pub fn update_count(&self) -> usize {
        self.count(|call| matches!(call, ProvisioningCall::Update(_)))
    }

    pub fn describe_count(&self) -> usize {
        self.count(|call| matches!(call, ProvisioningCall::Describe(_)))
    }

    pub fn validate_count(&self) -> usize {
        self.count(|call| matches!(call, ProvisioningCall::Validate(_)))
    }

    /// Last request applied to a stack by create or update
    pub fn last_request(&self, name: &str) -> Option<StackRequest> {
        self.stacks.lock().get(name).and_then(|record| record.request.clone())
    }

    fn count(&self, predicate: impl Fn(&ProvisioningCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }
}

#[async_trait]
impl ProvisioningService for ScriptedProvisioner {
    async fn validate_template(&self, body: &str) -> ProvisioningResult<()> {
        self.calls.lock().push(ProvisioningCall::Validate(body.to_string()));
        if serde_json::from_str::<serde_json::Value>(body).is_err() {
            return Err(ProvisioningError::Validation(
                "Template format error: JSON not well-formed.".to_string(),
            ));
        }
        match self.reject_marker.lock().as_deref() {
            Some(marker) if body.contains(marker) => Err(ProvisioningError::Validation(format!(
                "Template format error: Unrecognized resource types: [{marker}]"
            ))),
            _ => Ok(()),
        }
    }

    async fn describe_stack(&self, name: &StackName) -> ProvisioningResult<StackState> {
        self.calls
            .lock()
            .push(ProvisioningCall::Describe(name.as_str().to_string()));
        Ok(self
            .stacks
            .lock()
            .get(name.as_str())
            .map_or(StackState::Absent, |record| StackState::Present(record.status.clone())))
    }

    async fn create_stack(&self, request: &StackRequest, on_failure: OnFailure) -> ProvisioningResult<()> {
        let stack = request.name.as_str().to_string();
        self.calls.lock().push(ProvisioningCall::Create {
            stack: stack.clone(),
            on_failure,
        });
        if let Some(error) = self.create_errors.lock().pop_front() {
            return Err(error);
        }

        let mut stacks = self.stacks.lock();
        if stacks.contains_key(&stack) {
            return Err(ProvisioningError::AlreadyExists(format!("Stack [{stack}] already exists")));
        }
        stacks.insert(
            stack,
            StackRecord {
                status: StackStatus::new("CREATE_COMPLETE"),
                request: Some(request.clone()),
            },
        );
        Ok(())
    }

    async fn update_stack(&self, request: &StackRequest) -> ProvisioningResult<()> {
        let stack = request.name.as_str().to_string();
        self.calls.lock().push(ProvisioningCall::Update(stack.clone()));
        if let Some(error) = self.update_errors.lock().pop_front() {
            return Err(error);
        }

        let mut stacks = self.stacks.lock();
        let Some(record) = stacks.get_mut(&stack) else {
            return Err(ProvisioningError::StackNotFound(format!(
                "Stack with id {stack} does not exist"
            )));
        };
        if record.request.as_ref() == Some(request) {
            return Err(ProvisioningError::NoChanges);
        }
        record.status = StackStatus::new("UPDATE_COMPLETE");
        record.request = Some(request.clone());
        Ok(())
    }
}
