//! One-shot oracle registration at startup

use std::sync::Arc;
use std::time::Duration;

use ethers_core::types::Address;
use serde::Serialize;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::chain::FlightSuretyChain;
use crate::config::OracleConfig;
use crate::error::{ConfigError, ProvisioningFailure};
use crate::pool::IdentityPool;

/// Outcome of the provisioning phase
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProvisioningSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Failure reason per signer, in pool order.
    pub failures: Vec<(Address, String)>,
}

pub struct ProvisioningService {
    chain: Arc<dyn FlightSuretyChain>,
    pool: Arc<IdentityPool>,
    attempt_timeout: Duration,
}

impl ProvisioningService {
    pub fn new(chain: Arc<dyn FlightSuretyChain>, pool: Arc<IdentityPool>, attempt_timeout: Duration) -> Self {
        Self {
            chain,
            pool,
            attempt_timeout,
        }
    }

    /// Registers every pool signer concurrently and waits for all of them.
    ///
    /// Each attempt is independent: a failure or timeout is recorded against its
    /// signer and the others carry on. Consumes the service so it runs once.
    pub async fn run(self) -> ProvisioningSummary {
        info!(oracles = self.pool.len(), "provisioning oracle identities");

        let mut attempts = JoinSet::new();
        for signer in self.pool.signers() {
            let chain = self.chain.clone();
            let pool = self.pool.clone();
            let limit = self.attempt_timeout;

            attempts.spawn(async move {
                let outcome = match timeout(limit, provision_one(chain.as_ref(), &pool, signer)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ProvisioningFailure::TimedOut(limit.as_secs())),
                };
                (signer, outcome)
            });
        }

        while let Some(joined) = attempts.join_next().await {
            match joined {
                Ok((signer, Ok(indices))) => {
                    info!(?signer, ?indices, "oracle registered");
                }
                Ok((signer, Err(failure))) => {
                    warn!(?signer, error = %failure, "oracle provisioning failed");
                    if let Err(err) = self.pool.mark_failed(signer, failure.to_string()) {
                        error!(?signer, error = %err, "could not record provisioning failure");
                    }
                }
                Err(join_error) => {
                    error!(error = %join_error, "provisioning task aborted");
                }
            }
        }

        // A task that panicked never resolved its entry.
        for signer in self.pool.pending() {
            if let Err(err) = self.pool.mark_failed(signer, "provisioning task aborted") {
                error!(?signer, error = %err, "could not record provisioning failure");
            }
        }

        let failures = self.pool.failures();
        let summary = ProvisioningSummary {
            succeeded: self.pool.assigned_count(),
            failed: failures.len(),
            failures,
        };
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "provisioning complete"
        );
        summary
    }
}

async fn provision_one(
    chain: &dyn FlightSuretyChain,
    pool: &IdentityPool,
    signer: Address,
) -> Result<[u8; 3], ProvisioningFailure> {
    let fee = chain
        .registration_fee(signer)
        .await
        .map_err(ProvisioningFailure::Fee)?;
    chain
        .register_oracle(signer, fee)
        .await
        .map_err(ProvisioningFailure::Register)?;
    let indices = chain
        .my_indexes(signer)
        .await
        .map_err(ProvisioningFailure::Indexes)?;
    pool.assign(signer, indices)?;
    Ok(indices)
}

/// Resolves the ordered signer list: the first `count` configured accounts, or
/// `count` of the node's accounts starting at `account_offset`.
///
/// Also proves the node is reachable; failure here is fatal at startup.
pub async fn resolve_signers(
    config: &OracleConfig,
    chain: &dyn FlightSuretyChain,
) -> Result<Vec<Address>, ConfigError> {
    let (accounts, offset) = match &config.accounts {
        Some(accounts) => {
            chain.block_number().await.map_err(ConfigError::ChainUnreachable)?;
            (accounts.clone(), 0)
        }
        None => (
            chain.accounts().await.map_err(ConfigError::ChainUnreachable)?,
            config.account_offset,
        ),
    };

    let required = offset + config.count;
    if accounts.len() < required {
        return Err(ConfigError::NotEnoughAccounts {
            available: accounts.len(),
            required,
            offset,
            count: config.count,
        });
    }

    Ok(accounts[offset..required].to_vec())
}
