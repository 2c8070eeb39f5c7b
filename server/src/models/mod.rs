//! Data models for the oracle coordination server

pub mod oracle;
pub mod status;

use serde::{Deserialize, Serialize};

pub use oracle::{OracleIdentity, RequestRecord};
pub use status::FlightStatus;

/// Plain `{ "message": ... }` body returned by the dapp-facing endpoints
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
