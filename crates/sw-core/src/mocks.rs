//! Shared mocks for unit tests

use async_trait::async_trait;
use mockall::mock;
use sw_model::{StackName, StackState};

use crate::collaborators::ProvisioningService;
use crate::provisioning::{OnFailure, ProvisioningResult, StackRequest};

mock! {
    pub(crate) Provisioner {}

    #[async_trait]
    impl ProvisioningService for Provisioner {
        async fn validate_template(&self, body: &str) -> ProvisioningResult<()>;
        async fn describe_stack(&self, name: &StackName) -> ProvisioningResult<StackState>;
        async fn create_stack(&self, request: &StackRequest, on_failure: OnFailure) -> ProvisioningResult<()>;
        async fn update_stack(&self, request: &StackRequest) -> ProvisioningResult<()>;
    }
}
