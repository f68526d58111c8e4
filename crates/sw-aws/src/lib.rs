//! Stackwright AWS Adapters
//!
//! - **S3BlobStore**: artifacts and configuration, KMS-encrypted on request
//! - **CloudFormationService**: template validation and stack lifecycle
//! - **AwsClients**: both clients from one SDK configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use sw_aws::{AwsClients, AwsCredentials, CloudFormationService, S3BlobStore};
//!
//! let clients = AwsClients::connect(&AwsCredentials::load(path)?).await;
//! let blob_store = S3BlobStore::new(clients.s3.clone());
//! let provisioning = CloudFormationService::new(clients.cloudformation.clone());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod clients;
pub mod cloudformation;
pub mod s3;

// Re-exports for convenience
pub use clients::{AwsClients, AwsCredentials, CredentialsError};
pub use cloudformation::CloudFormationService;
pub use s3::S3BlobStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
