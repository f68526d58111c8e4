//! CloudFormation provisioning service
//!
//! Service errors carry a code and a message; both go through
//! [`classify_service_error`] so the orchestrator only ever sees
//! [`ProvisioningError`] variants.

use std::error::Error;

use async_trait::async_trait;
use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cloudformation::types::{self, Parameter};
use aws_sdk_cloudformation::Client;
use sw_core::{
    classify_service_error, OnFailure, ProvisioningError, ProvisioningResult, ProvisioningService, StackRequest,
};
use sw_model::{ParameterDeclaration, StackName, StackState, StackStatus};
use tracing::debug;

/// [`ProvisioningService`] over one CloudFormation client
#[derive(Debug, Clone)]
pub struct CloudFormationService {
    client: Client,
}

impl CloudFormationService {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn classify<E, R>(err: &SdkError<E, R>) -> ProvisioningError
where
    E: ProvideErrorMetadata + Error + 'static,
    R: std::fmt::Debug,
{
    match err.as_service_error() {
        Some(service) => classify_service_error(service.code(), service.message()),
        None => ProvisioningError::Transport(DisplayErrorContext(err).to_string()),
    }
}

fn parameters(declarations: &[ParameterDeclaration]) -> Vec<Parameter> {
    declarations
        .iter()
        .map(|p| {
            Parameter::builder()
                .parameter_key(&p.name)
                .parameter_value(&p.value)
                .build()
        })
        .collect()
}

fn capabilities(request: &StackRequest) -> Vec<types::Capability> {
    request
        .capabilities
        .iter()
        .map(|capability| types::Capability::from(capability.as_str()))
        .collect()
}

/// State of the first described stack; no stacks means absent
fn stack_state(status: Option<&str>) -> StackState {
    status.map_or(StackState::Absent, |status| StackState::Present(StackStatus::new(status)))
}

#[async_trait]
impl ProvisioningService for CloudFormationService {
    async fn validate_template(&self, body: &str) -> ProvisioningResult<()> {
        self.client
            .validate_template()
            .template_body(body)
            .send()
            .await
            .map_err(|e| classify(&e))?;
        Ok(())
    }

    async fn describe_stack(&self, name: &StackName) -> ProvisioningResult<StackState> {
        let output = match self.client.describe_stacks().stack_name(name.as_str()).send().await {
            Ok(output) => output,
            Err(e) => {
                return match classify(&e) {
                    ProvisioningError::StackNotFound(message) => {
                        debug!(stack = %name, message, "stack does not exist");
                        Ok(StackState::Absent)
                    }
                    other => Err(other),
                };
            }
        };

        let status = output
            .stacks()
            .first()
            .and_then(|stack| stack.stack_status())
            .map(|status| status.as_str());
        Ok(stack_state(status))
    }

    async fn create_stack(&self, request: &StackRequest, on_failure: OnFailure) -> ProvisioningResult<()> {
        self.client
            .create_stack()
            .stack_name(request.name.as_str())
            .template_url(&request.template_url)
            .set_parameters(Some(parameters(&request.parameters)))
            .set_capabilities(Some(capabilities(request)))
            .on_failure(types::OnFailure::from(on_failure.as_str()))
            .send()
            .await
            .map_err(|e| classify(&e))?;
        Ok(())
    }

    async fn update_stack(&self, request: &StackRequest) -> ProvisioningResult<()> {
        self.client
            .update_stack()
            .stack_name(request.name.as_str())
            .template_url(&request.template_url)
            .set_parameters(Some(parameters(&request.parameters)))
            .set_capabilities(Some(capabilities(request)))
            .send()
            .await
            .map_err(|e| classify(&e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sw_model::StackIdentity;

    #[test]
    fn parameters_keep_declaration_order() {
        let converted = parameters(&[
            ParameterDeclaration::reserved("stackwrightS3Bucket", "acme-deployments"),
            ParameterDeclaration::user_declared("InstanceType", "t3.micro"),
        ]);

        let pairs: Vec<(Option<&str>, Option<&str>)> = converted
            .iter()
            .map(|p| (p.parameter_key(), p.parameter_value()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (Some("stackwrightS3Bucket"), Some("acme-deployments")),
                (Some("InstanceType"), Some("t3.micro")),
            ]
        );
    }

    #[test]
    fn request_acknowledges_iam() {
        let request = StackRequest::new(
            StackIdentity::new("acme", "web", "test").stack_name(),
            "https://s3.amazonaws.com/b/main.json".to_string(),
            Vec::new(),
        );
        assert_eq!(capabilities(&request), vec![types::Capability::CapabilityIam]);
    }

    #[test]
    fn on_failure_maps_to_service_enum() {
        assert_eq!(
            types::OnFailure::from(OnFailure::DoNothing.as_str()),
            types::OnFailure::DoNothing
        );
    }

    #[test]
    fn missing_status_is_absent() {
        assert_eq!(stack_state(None), StackState::Absent);
        assert_eq!(
            stack_state(Some("ROLLBACK_COMPLETE")),
            StackState::Present(StackStatus::new("ROLLBACK_COMPLETE"))
        );
    }
}
