use ethers_core::types::Address;

use super::{parse_required, Lookup};
use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractsConfig {
    /// FlightSuretyApp: registration, index queries, responses, `OracleRequest` events.
    pub app_contract: Address,
    /// FlightSuretyData: `creditInsurees` and generic change notifications.
    pub data_contract: Address,
}

impl ContractsConfig {
    pub(super) fn from_lookup(lookup: &Lookup<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            app_contract: parse_required(lookup, "APP_CONTRACT_ADDRESS")?,
            data_contract: parse_required(lookup, "DATA_CONTRACT_ADDRESS")?,
        })
    }
}
