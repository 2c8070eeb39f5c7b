//! Chain-facing services: startup provisioning and response submission

pub mod provisioning;
pub mod submitter;

pub use provisioning::{resolve_signers, ProvisioningService, ProvisioningSummary};
pub use submitter::{ResponseSubmitter, SubmissionReceipt};
