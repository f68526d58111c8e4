//! Stack Reconciler
//!
//! Create first; an "already exists" answer turns into exactly one update,
//! and an update that changes nothing is a no-op. Both recovered cases are
//! ordinary outcomes. Nothing waits for the service to converge.
//!
//! ```text
//! NoStack → Creating ─┬→ Created
//!                     ├→ Updating ─┬→ Updated
//!                     │            ├→ NoOp
//!                     │            └→ Failed
//!                     └→ Failed
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use sw_model::{ParameterDeclaration, StackName};
use tracing::{debug, info};

use crate::collaborators::ProvisioningService;
use crate::error::{DeployError, DeployResult};
use crate::provisioning::{OnFailure, ProvisioningError, StackRequest};

/// Reconciler state, traced on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReconcileState {
    NoStack,
    Creating,
    Updating,
    Created,
    Updated,
    NoOp,
    Failed,
}

impl ReconcileState {
    /// Whether no further transition follows
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Created | Self::Updated | Self::NoOp | Self::Failed)
    }
}

/// Successful terminal state of a reconcile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconcileOutcome {
    Created,
    Updated,
    NoOp,
}

impl ReconcileOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Updated => "UPDATED",
            Self::NoOp => "NO_OP",
        }
    }
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ReconcileOutcome> for ReconcileState {
    fn from(outcome: ReconcileOutcome) -> Self {
        match outcome {
            ReconcileOutcome::Created => Self::Created,
            ReconcileOutcome::Updated => Self::Updated,
            ReconcileOutcome::NoOp => Self::NoOp,
        }
    }
}

/// Drives one stack to its declared template and parameters
pub struct StackReconciler<'a> {
    provisioning: &'a dyn ProvisioningService,
    state: ReconcileState,
}

impl<'a> StackReconciler<'a> {
    #[must_use]
    pub fn new(provisioning: &'a dyn ProvisioningService) -> Self {
        Self {
            provisioning,
            state: ReconcileState::NoStack,
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> ReconcileState {
        self.state
    }

    /// Create the stack, or update it if it already exists
    ///
    /// # Errors
    /// Any provisioning error other than "already exists" on create and
    /// "no updates" on update, unchanged.
    pub async fn reconcile(
        &mut self,
        stack_name: &StackName,
        template_url: &str,
        parameters: Vec<ParameterDeclaration>,
    ) -> DeployResult<ReconcileOutcome> {
        let request = StackRequest::new(stack_name.clone(), template_url, parameters);

        self.transition(ReconcileState::Creating, stack_name);
        let outcome = match self.provisioning.create_stack(&request, OnFailure::DoNothing).await {
            Ok(()) => ReconcileOutcome::Created,
            Err(ProvisioningError::AlreadyExists(_)) => {
                info!(stack = %stack_name, "stack already exists, updating");
                self.transition(ReconcileState::Updating, stack_name);
                match self.provisioning.update_stack(&request).await {
                    Ok(()) => ReconcileOutcome::Updated,
                    Err(ProvisioningError::NoChanges) => {
                        info!(stack = %stack_name, "no updates to perform");
                        ReconcileOutcome::NoOp
                    }
                    Err(e) => return Err(self.fail(stack_name, e)),
                }
            }
            Err(e) => return Err(self.fail(stack_name, e)),
        };

        self.transition(outcome.into(), stack_name);
        Ok(outcome)
    }

    fn transition(&mut self, next: ReconcileState, stack_name: &StackName) {
        debug!(stack = %stack_name, from = ?self.state, to = ?next, "reconcile transition");
        self.state = next;
    }

    fn fail(&mut self, stack_name: &StackName, error: ProvisioningError) -> DeployError {
        self.transition(ReconcileState::Failed, stack_name);
        error.into()
    }
}
