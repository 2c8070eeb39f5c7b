//! Ethereum JSON-RPC implementation of [`FlightSuretyChain`]
//!
//! Transactions go through `eth_sendTransaction`, so the node signs for its
//! unlocked accounts. Receipts are polled until the transaction is mined.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ethers_core::types::{Address, Bytes, Log, TransactionRequest, H256, U256, U64};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::sleep;
use tracing::{debug, warn};

use super::abi;
use super::{BlockRange, FlightSuretyChain};
use crate::config::{ChainConfig, GasSettings};
use crate::error::ChainError;
use crate::models::{FlightStatus, RequestRecord};

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ReceiptStatus {
    status: Option<U64>,
}

pub struct JsonRpcChain {
    http: Client,
    config: ChainConfig,
    next_id: AtomicU64,
}

impl JsonRpcChain {
    /// Every request is bounded by `config.rpc_timeout`; a stalled node surfaces
    /// as [`ChainError::Transport`].
    pub fn new(config: ChainConfig) -> Result<Self, ChainError> {
        let http = Client::builder().timeout(config.rpc_timeout).build()?;
        Ok(Self {
            http,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    async fn rpc_call<T: DeserializeOwned>(&self, method: &'static str, params: Value) -> Result<T, ChainError> {
        self.rpc_request(method, params)
            .await?
            .ok_or(ChainError::EmptyResponse(method))
    }

    /// Like `rpc_call`, but a `null` result is a valid answer.
    async fn rpc_request<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<Option<T>, ChainError> {
        let response = self
            .http
            .post(&self.config.rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": self.next_id.fetch_add(1, Ordering::Relaxed),
                "method": method,
                "params": params,
            }))
            .send()
            .await?
            .error_for_status()?
            .json::<RpcResponse<T>>()
            .await?;

        if let Some(error) = response.error {
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(response.result)
    }

    async fn call(&self, from: Address, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let request = TransactionRequest::new().from(from).to(to).data(data);
        self.rpc_call("eth_call", json!([request, "latest"])).await
    }

    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
        value: Option<U256>,
        gas: GasSettings,
    ) -> Result<H256, ChainError> {
        let mut request = TransactionRequest::new()
            .from(from)
            .to(to)
            .data(data)
            .gas(gas.gas)
            .gas_price(gas.gas_price);
        if let Some(value) = value {
            request = request.value(value);
        }

        let tx_hash: H256 = self.rpc_call("eth_sendTransaction", json!([request])).await?;
        self.wait_for_receipt(tx_hash).await
    }

    /// Polls until the receipt exists. Unbounded; callers apply their own deadline.
    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<H256, ChainError> {
        loop {
            let receipt: Option<ReceiptStatus> = self
                .rpc_request("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;

            match receipt {
                Some(ReceiptStatus {
                    status: Some(status),
                }) if status.is_zero() => return Err(ChainError::Reverted(tx_hash)),
                Some(_) => return Ok(tx_hash),
                None => {
                    debug!(?tx_hash, "transaction pending");
                    sleep(self.config.receipt_poll_interval).await;
                }
            }
        }
    }

    async fn logs(&self, address: Address, topic: Option<H256>, range: BlockRange) -> Result<Vec<Log>, ChainError> {
        let mut filter = json!({
            "address": address,
            "fromBlock": U64::from(range.from),
            "toBlock": U64::from(range.to),
        });
        if let Some(topic) = topic {
            filter["topics"] = json!([topic]);
        }
        self.rpc_call("eth_getLogs", json!([filter])).await
    }
}

#[async_trait]
impl FlightSuretyChain for JsonRpcChain {
    async fn accounts(&self) -> Result<Vec<Address>, ChainError> {
        self.rpc_call("eth_accounts", json!([])).await
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        let block: U64 = self.rpc_call("eth_blockNumber", json!([])).await?;
        Ok(block.as_u64())
    }

    async fn registration_fee(&self, from: Address) -> Result<U256, ChainError> {
        let output = self
            .call(
                from,
                self.config.contracts.app_contract,
                abi::encode_call(abi::REGISTRATION_FEE, &[]),
            )
            .await?;
        abi::decode_uint256(&output)
    }

    async fn register_oracle(&self, signer: Address, fee: U256) -> Result<H256, ChainError> {
        self.send_transaction(
            signer,
            self.config.contracts.app_contract,
            abi::encode_call(abi::REGISTER_ORACLE, &[]),
            Some(fee),
            self.config.registration_gas,
        )
        .await
    }

    async fn my_indexes(&self, signer: Address) -> Result<[u8; 3], ChainError> {
        let output = self
            .call(
                signer,
                self.config.contracts.app_contract,
                abi::encode_call(abi::GET_MY_INDEXES, &[]),
            )
            .await?;
        abi::decode_indexes(&output)
    }

    async fn submit_oracle_response(
        &self,
        signer: Address,
        record: &RequestRecord,
        status: FlightStatus,
    ) -> Result<H256, ChainError> {
        self.send_transaction(
            signer,
            self.config.contracts.app_contract,
            abi::submit_oracle_response_call(record, status),
            None,
            self.config.response_gas,
        )
        .await
    }

    async fn credit_insurees(&self, signer: Address, flight: &str) -> Result<H256, ChainError> {
        self.send_transaction(
            signer,
            self.config.contracts.data_contract,
            abi::credit_insurees_call(flight),
            None,
            self.config.response_gas,
        )
        .await
    }

    async fn oracle_requests(&self, range: BlockRange) -> Result<Vec<RequestRecord>, ChainError> {
        let logs = self
            .logs(
                self.config.contracts.app_contract,
                Some(abi::oracle_request_topic()),
                range,
            )
            .await?;

        Ok(logs
            .iter()
            .filter_map(|log| match abi::decode_oracle_request(log) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(tx_hash = ?log.transaction_hash, error = %err, "skipping undecodable OracleRequest log");
                    None
                }
            })
            .collect())
    }

    async fn data_contract_logs(&self, range: BlockRange) -> Result<Vec<Log>, ChainError> {
        self.logs(self.config.contracts.data_contract, None, range).await
    }
}
