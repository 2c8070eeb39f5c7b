//! Error types for the oracle coordination server
//!
//! Only [`ConfigError`] is fatal; every other error is scoped to a single
//! identity, request or poll cycle and is reported without stopping the server.

use ethers_core::types::{Address, H256};
use thiserror::Error;

use crate::models::FlightStatus;

/// Startup problems: bad environment, malformed identity list, unreachable node.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("chain node unreachable: {0}")]
    ChainUnreachable(#[source] ChainError),

    #[error("node exposes {available} accounts, need {required} (offset {offset} + count {count})")]
    NotEnoughAccounts {
        available: usize,
        required: usize,
        offset: usize,
        count: usize,
    },

    #[error("identity list is empty")]
    NoIdentities,

    #[error("identity {0:?} is listed more than once")]
    DuplicateIdentity(Address),
}

/// Failures talking to the chain node or decoding what it returns.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("rpc response for {0} carried neither result nor error")]
    EmptyResponse(&'static str),

    #[error("transaction {0:?} reverted")]
    Reverted(H256),

    #[error("abi decode failed: {0}")]
    Decode(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("signer {0:?} is not part of the pool")]
    UnknownSigner(Address),

    #[error("signer {0:?} already has assigned indices")]
    AlreadyAssigned(Address),

    #[error("signer {0:?} already failed provisioning")]
    AlreadyFailed(Address),

    #[error("indices {indices:?} must be 3 distinct values in 0..={max}")]
    InvalidIndices { indices: [u8; 3], max: u8 },
}

/// Per-identity provisioning failure. Never affects sibling identities.
#[derive(Debug, Error)]
pub enum ProvisioningFailure {
    #[error("registration fee query failed: {0}")]
    Fee(#[source] ChainError),

    #[error("registerOracle failed: {0}")]
    Register(#[source] ChainError),

    #[error("index query failed: {0}")]
    Indexes(#[source] ChainError),

    #[error("index assignment rejected: {0}")]
    Assign(#[from] PoolError),

    #[error("timed out after {0}s")]
    TimedOut(u64),
}

/// Event stream failure for one poll cycle. The subscription keeps running.
#[derive(Debug, Error)]
#[error("event stream {stage} failed: {source}")]
pub struct TransportFailure {
    pub stage: &'static str,
    #[source]
    pub source: ChainError,
}

/// Terminal failure of one (identity, request) submission.
#[derive(Debug, Error)]
pub enum SubmissionFailure {
    #[error("submitOracleResponse with status {status} failed: {source}")]
    Response {
        status: FlightStatus,
        #[source]
        source: ChainError,
    },

    #[error("creditInsurees after response {response_tx:?} failed: {source}")]
    Credit {
        response_tx: H256,
        #[source]
        source: ChainError,
    },

    #[error("timed out after {0}s")]
    TimedOut(u64),
}
