use ethers_core::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

/// A provisioned oracle: the signer plus the three indices the app contract gave it.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct OracleIdentity {
    pub signer: Address,
    pub indices: [u8; 3],
}

impl OracleIdentity {
    pub fn responds_to(&self, index: u8) -> bool {
        self.indices.contains(&index)
    }
}

/// One `OracleRequest` event emitted by the app contract.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub index: u8,
    pub airline: Address,
    pub flight: String,
    pub timestamp: U256,
    // Where the event was seen; informational only.
    pub block_number: Option<u64>,
    pub tx_hash: Option<H256>,
}

impl RequestRecord {
    pub fn new(index: u8, airline: Address, flight: impl Into<String>, timestamp: U256) -> Self {
        Self {
            index,
            airline,
            flight: flight.into(),
            timestamp,
            block_number: None,
            tx_hash: None,
        }
    }

    /// Key that identifies the logical request regardless of redelivery.
    /// Not used for deduplication today: every delivery is dispatched.
    pub fn dedup_key(&self) -> (u8, Address, &str, U256) {
        (self.index, self.airline, self.flight.as_str(), self.timestamp)
    }
}
