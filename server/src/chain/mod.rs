//! Seam between the coordination logic and the FlightSurety contracts

pub mod abi;
pub mod rpc;

use async_trait::async_trait;
use ethers_core::types::{Address, Log, H256, U256};

use crate::error::ChainError;
use crate::models::{FlightStatus, RequestRecord};

pub use rpc::JsonRpcChain;

/// Inclusive block range used for log queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub from: u64,
    pub to: u64,
}

/// Operations the coordinator consumes from the app and data contracts.
///
/// Every state-mutating method resolves only once the transaction is mined and
/// returns its hash; a reverted transaction is reported as [`ChainError::Reverted`].
/// Waiting for the mined receipt has no deadline of its own, so callers wrap
/// these methods in a timeout.
#[async_trait]
pub trait FlightSuretyChain: Send + Sync {
    /// Accounts managed by the node, in node order.
    async fn accounts(&self) -> Result<Vec<Address>, ChainError>;

    async fn block_number(&self) -> Result<u64, ChainError>;

    /// `REGISTRATION_FEE()` read with `from` as caller.
    async fn registration_fee(&self, from: Address) -> Result<U256, ChainError>;

    /// `registerOracle()` sent from `signer`, paying `fee`.
    async fn register_oracle(&self, signer: Address, fee: U256) -> Result<H256, ChainError>;

    /// `getMyIndexes()` read with `signer` as caller.
    async fn my_indexes(&self, signer: Address) -> Result<[u8; 3], ChainError>;

    async fn submit_oracle_response(
        &self,
        signer: Address,
        record: &RequestRecord,
        status: FlightStatus,
    ) -> Result<H256, ChainError>;

    /// `creditInsurees(flight)` on the data contract, sent as a transaction.
    async fn credit_insurees(&self, signer: Address, flight: &str) -> Result<H256, ChainError>;

    /// Decoded `OracleRequest` events in `range`, in log order.
    async fn oracle_requests(&self, range: BlockRange) -> Result<Vec<RequestRecord>, ChainError>;

    /// Raw logs emitted by the data contract in `range`.
    async fn data_contract_logs(&self, range: BlockRange) -> Result<Vec<Log>, ChainError>;
}
