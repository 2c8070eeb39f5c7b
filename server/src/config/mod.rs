//! Environment-driven configuration
//!
//! Everything is read once at startup. Any malformed value is a [`ConfigError`]
//! and aborts the process before provisioning starts.

pub mod contracts;

use std::fmt::Display;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use ethers_core::types::{Address, U256};

use crate::error::ConfigError;

pub use contracts::ContractsConfig;

type Lookup<'a> = dyn Fn(&str) -> Option<String> + 'a;

pub const DEFAULT_ORACLE_COUNT: usize = 25;
pub const DEFAULT_ACCOUNT_OFFSET: usize = 20;
pub const DEFAULT_INDEX_MAX: u8 = 9;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub http: HttpConfig,
    pub chain: ChainConfig,
    pub oracles: OracleConfig,
    pub events: EventsConfig,
}

#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub contracts: ContractsConfig,
    pub registration_gas: GasSettings,
    pub response_gas: GasSettings,
    pub receipt_poll_interval: Duration,
    /// Upper bound for a single JSON-RPC request.
    pub rpc_timeout: Duration,
}

/// Gas limit and price attached to an outbound transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasSettings {
    pub gas: U256,
    pub gas_price: U256,
}

#[derive(Clone, Debug)]
pub struct OracleConfig {
    /// Explicit signer list. When absent the node's `eth_accounts` are used.
    pub accounts: Option<Vec<Address>>,
    pub account_offset: usize,
    pub count: usize,
    pub index_max: u8,
    pub provisioning_timeout: Duration,
    pub submission_timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct EventsConfig {
    pub from_block: StartBlock,
    pub poll_interval: Duration,
}

/// Where the event listener starts reading logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartBlock {
    Genesis,
    Latest,
}

impl FromStr for StartBlock {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "genesis" | "earliest" | "0" => Ok(StartBlock::Genesis),
            "latest" => Ok(StartBlock::Latest),
            other => Err(format!("expected `genesis` or `latest`, got `{other}`")),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: &Lookup<'_>) -> Result<Self, ConfigError> {
        let http = HttpConfig {
            host: parse_or(lookup, "HOST", IpAddr::from([0, 0, 0, 0]))?,
            port: parse_or(lookup, "PORT", 3000)?,
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|origins| parse_origins(&origins))
                .unwrap_or_default(),
        };

        let chain = ChainConfig {
            rpc_url: lookup("ETH_RPC_URL").unwrap_or_else(|| "http://127.0.0.1:8545".to_string()),
            contracts: ContractsConfig::from_lookup(lookup)?,
            registration_gas: GasSettings {
                gas: U256::from(parse_or::<u64>(lookup, "REGISTRATION_GAS", 5_000_000)?),
                gas_price: U256::from(parse_or::<u64>(lookup, "REGISTRATION_GAS_PRICE", 20_000_000)?),
            },
            response_gas: GasSettings {
                gas: U256::from(parse_or::<u64>(lookup, "RESPONSE_GAS", 450_000)?),
                gas_price: U256::from(parse_or::<u64>(lookup, "RESPONSE_GAS_PRICE", 200_000_000)?),
            },
            receipt_poll_interval: Duration::from_millis(parse_or(lookup, "RECEIPT_POLL_INTERVAL_MS", 250)?),
            rpc_timeout: Duration::from_secs(parse_or(lookup, "RPC_TIMEOUT_SECONDS", 10)?),
        };

        let oracles = OracleConfig {
            accounts: parse_accounts(lookup)?,
            account_offset: parse_or(lookup, "ORACLE_ACCOUNT_OFFSET", DEFAULT_ACCOUNT_OFFSET)?,
            count: parse_or(lookup, "ORACLE_COUNT", DEFAULT_ORACLE_COUNT)?,
            index_max: parse_or(lookup, "ORACLE_INDEX_MAX", DEFAULT_INDEX_MAX)?,
            provisioning_timeout: Duration::from_secs(parse_or(lookup, "PROVISIONING_TIMEOUT_SECONDS", 60)?),
            submission_timeout: Duration::from_secs(parse_or(lookup, "SUBMISSION_TIMEOUT_SECONDS", 30)?),
        };
        if oracles.count == 0 {
            return Err(ConfigError::Invalid {
                key: "ORACLE_COUNT",
                value: "0".to_string(),
                reason: "at least one oracle is required".to_string(),
            });
        }

        let events = EventsConfig {
            from_block: parse_or(lookup, "EVENTS_FROM_BLOCK", StartBlock::Latest)?,
            poll_interval: Duration::from_millis(parse_or(lookup, "EVENT_POLL_INTERVAL_MS", 1000)?),
        };

        Ok(Self {
            http,
            chain,
            oracles,
            events,
        })
    }
}

fn parse_accounts(lookup: &Lookup<'_>) -> Result<Option<Vec<Address>>, ConfigError> {
    let Some(raw) = lookup("ORACLE_ACCOUNTS") else {
        return Ok(None);
    };

    raw.split(',')
        .map(str::trim)
        .filter(|account| !account.is_empty())
        .map(|account| {
            account.parse::<Address>().map_err(|err| ConfigError::Invalid {
                key: "ORACLE_ACCOUNTS",
                value: account.to_string(),
                reason: err.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(ToString::to_string)
        .collect();

    if origins.iter().any(|origin| origin == "*") {
        Vec::new()
    } else {
        origins
    }
}

fn parse_or<T>(lookup: &Lookup<'_>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(value) => parse_value(key, value),
        None => Ok(default),
    }
}

fn parse_required<T>(lookup: &Lookup<'_>, key: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let value = lookup(key).ok_or(ConfigError::Missing(key))?;
    parse_value(key, value)
}

fn parse_value<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let parsed = value.trim().parse::<T>();
    match parsed {
        Ok(parsed) => Ok(parsed),
        Err(err) => Err(ConfigError::Invalid {
            key,
            reason: err.to_string(),
            value,
        }),
    }
}
