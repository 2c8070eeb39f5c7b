#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use ethers_core::types::{Address, Log, H256, U256};

use flightsurety_oracles::chain::{BlockRange, FlightSuretyChain};
use flightsurety_oracles::config::{ChainConfig, ContractsConfig, GasSettings};
use flightsurety_oracles::error::ChainError;
use flightsurety_oracles::models::{FlightStatus, RequestRecord};
use flightsurety_oracles::pool::IdentityPool;
use flightsurety_oracles::services::ProvisioningService;

pub const POOL_SIZE: usize = 25;

/// Indices handed out by the mock; 3 is deliberately never assigned.
const INDEX_CYCLE: [u8; 9] = [0, 1, 2, 4, 5, 6, 7, 8, 9];

pub fn signer(n: usize) -> Address {
    Address::from_low_u64_be(0x100 + n as u64)
}

pub fn flight_request(index: u8, flight: &str) -> RequestRecord {
    RequestRecord::new(index, Address::repeat_byte(0xa1), flight, U256::from(1_700_000_000u64))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedResponse {
    pub signer: Address,
    pub record: RequestRecord,
    pub status: FlightStatus,
}

#[derive(Default)]
pub struct MockState {
    pub accounts: Vec<Address>,
    pub fee: U256,
    pub indexes: HashMap<Address, [u8; 3]>,
    pub reject_registration: HashSet<Address>,
    pub stall_registration: HashSet<Address>,
    pub fail_submissions: HashSet<Address>,
    pub stall_submissions: HashSet<Address>,
    pub fail_credits: HashSet<Address>,
    pub unreachable: bool,
    pub latest_block: u64,
    pub events: Vec<(u64, RequestRecord)>,
    pub failing_log_polls: usize,
    pub registrations: Vec<(Address, U256)>,
    pub submissions: Vec<SubmittedResponse>,
    pub credits: Vec<(Address, String)>,
    pub log_queries: Vec<BlockRange>,
    pub data_log_queries: Vec<BlockRange>,
    pub data_logs_unavailable: bool,
    next_tx: u64,
}

/// In-memory stand-in for the FlightSurety contracts.
#[derive(Default)]
pub struct MockChain {
    state: Mutex<MockState>,
}

impl MockChain {
    /// `count` accounts, each assigned three distinct indices that never include 3.
    /// Account 7 holds {2, 5, 9}.
    pub fn with_oracles(count: usize) -> Arc<Self> {
        let chain = MockChain::default();
        {
            let mut state = chain.state();
            state.fee = U256::exp10(18);
            for n in 0..count {
                let indexes = if n == 7 {
                    [2, 5, 9]
                } else {
                    [
                        INDEX_CYCLE[n % 9],
                        INDEX_CYCLE[(n + 1) % 9],
                        INDEX_CYCLE[(n + 2) % 9],
                    ]
                };
                state.accounts.push(signer(n));
                state.indexes.insert(signer(n), indexes);
            }
        }
        Arc::new(chain)
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn submissions(&self) -> Vec<SubmittedResponse> {
        self.state().submissions.clone()
    }

    pub fn credits(&self) -> Vec<(Address, String)> {
        self.state().credits.clone()
    }

    fn next_tx(state: &mut MockState) -> H256 {
        state.next_tx += 1;
        H256::from_low_u64_be(state.next_tx)
    }

    fn check_reachable(state: &MockState) -> Result<(), ChainError> {
        if state.unreachable {
            return Err(ChainError::Rpc {
                code: -32603,
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FlightSuretyChain for MockChain {
    async fn accounts(&self) -> Result<Vec<Address>, ChainError> {
        let state = self.state();
        Self::check_reachable(&state)?;
        Ok(state.accounts.clone())
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        let state = self.state();
        Self::check_reachable(&state)?;
        Ok(state.latest_block)
    }

    async fn registration_fee(&self, _from: Address) -> Result<U256, ChainError> {
        Ok(self.state().fee)
    }

    async fn register_oracle(&self, signer: Address, fee: U256) -> Result<H256, ChainError> {
        let stall = self.state().stall_registration.contains(&signer);
        if stall {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        let mut state = self.state();
        let tx = Self::next_tx(&mut state);
        if fee != state.fee || state.reject_registration.contains(&signer) {
            return Err(ChainError::Reverted(tx));
        }
        state.registrations.push((signer, fee));
        Ok(tx)
    }

    async fn my_indexes(&self, signer: Address) -> Result<[u8; 3], ChainError> {
        let state = self.state();
        if !state.registrations.iter().any(|(registered, _)| *registered == signer) {
            return Err(ChainError::Rpc {
                code: -32000,
                message: "Not registered as an oracle".to_string(),
            });
        }
        state
            .indexes
            .get(&signer)
            .copied()
            .ok_or_else(|| ChainError::Decode("no indexes".to_string()))
    }

    async fn submit_oracle_response(
        &self,
        signer: Address,
        record: &RequestRecord,
        status: FlightStatus,
    ) -> Result<H256, ChainError> {
        let stall = self.state().stall_submissions.contains(&signer);
        if stall {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        let mut state = self.state();
        let tx = Self::next_tx(&mut state);
        if state.fail_submissions.contains(&signer) {
            return Err(ChainError::Reverted(tx));
        }
        state.submissions.push(SubmittedResponse {
            signer,
            record: record.clone(),
            status,
        });
        Ok(tx)
    }

    async fn credit_insurees(&self, signer: Address, flight: &str) -> Result<H256, ChainError> {
        let mut state = self.state();
        let tx = Self::next_tx(&mut state);
        if state.fail_credits.contains(&signer) {
            return Err(ChainError::Reverted(tx));
        }
        state.credits.push((signer, flight.to_string()));
        Ok(tx)
    }

    async fn oracle_requests(&self, range: BlockRange) -> Result<Vec<RequestRecord>, ChainError> {
        let mut state = self.state();
        Self::check_reachable(&state)?;
        if state.failing_log_polls > 0 {
            state.failing_log_polls -= 1;
            return Err(ChainError::Rpc {
                code: -32005,
                message: "query timeout".to_string(),
            });
        }
        state.log_queries.push(range);
        Ok(state
            .events
            .iter()
            .filter(|(block, _)| (range.from..=range.to).contains(block))
            .map(|(block, record)| RequestRecord {
                block_number: Some(*block),
                ..record.clone()
            })
            .collect())
    }

    async fn data_contract_logs(&self, range: BlockRange) -> Result<Vec<Log>, ChainError> {
        let mut state = self.state();
        Self::check_reachable(&state)?;
        if state.data_logs_unavailable {
            return Err(ChainError::Rpc {
                code: -32000,
                message: "filter not found".to_string(),
            });
        }
        state.data_log_queries.push(range);
        Ok(Vec::new())
    }
}

/// Pool over the mock's accounts, provisioned through the real service.
pub async fn provisioned_pool(chain: &Arc<MockChain>) -> Arc<IdentityPool> {
    let accounts = chain.state().accounts.clone();
    let pool = Arc::new(IdentityPool::new(accounts, 9).unwrap());
    ProvisioningService::new(chain.clone(), pool.clone(), Duration::from_secs(5))
        .run()
        .await;
    pool
}

/// JSON-RPC URL of a server that accepts connections and never answers.
pub async fn silent_rpc_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}")
}

pub fn chain_config(rpc_url: String, rpc_timeout: Duration) -> ChainConfig {
    let gas = GasSettings {
        gas: U256::from(450_000u64),
        gas_price: U256::from(200_000_000u64),
    };
    ChainConfig {
        rpc_url,
        contracts: ContractsConfig {
            app_contract: Address::repeat_byte(0x11),
            data_contract: Address::repeat_byte(0x22),
        },
        registration_gas: gas,
        response_gas: gas,
        receipt_poll_interval: Duration::from_millis(10),
        rpc_timeout,
    }
}
