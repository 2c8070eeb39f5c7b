//! Oracle response submission

use std::sync::Arc;
use std::time::Duration;

use ethers_core::types::{Address, H256};
use serde::Serialize;
use tokio::time::timeout;

use crate::chain::FlightSuretyChain;
use crate::error::SubmissionFailure;
use crate::models::{FlightStatus, OracleIdentity, RequestRecord};
use crate::status::StatusControl;

/// Mined transactions produced by one successful submission
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub signer: Address,
    pub status: FlightStatus,
    pub response_tx: H256,
    /// Present when the status was `LateAirline`.
    pub credit_tx: Option<H256>,
}

pub struct ResponseSubmitter {
    chain: Arc<dyn FlightSuretyChain>,
    status: StatusControl,
    submission_timeout: Duration,
}

impl ResponseSubmitter {
    pub fn new(chain: Arc<dyn FlightSuretyChain>, status: StatusControl, submission_timeout: Duration) -> Self {
        Self {
            chain,
            status,
            submission_timeout,
        }
    }

    /// Answers `record` on behalf of `identity` with the status configured right now.
    ///
    /// A late-airline answer is followed by a `creditInsurees` transaction for the
    /// flight. One attempt only; any failure is final for this pair.
    pub async fn submit(
        &self,
        identity: &OracleIdentity,
        record: &RequestRecord,
    ) -> Result<SubmissionReceipt, SubmissionFailure> {
        let status = self.status.current();

        match timeout(self.submission_timeout, self.send(identity.signer, record, status)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(SubmissionFailure::TimedOut(self.submission_timeout.as_secs())),
        }
    }

    async fn send(
        &self,
        signer: Address,
        record: &RequestRecord,
        status: FlightStatus,
    ) -> Result<SubmissionReceipt, SubmissionFailure> {
        let response_tx = self
            .chain
            .submit_oracle_response(signer, record, status)
            .await
            .map_err(|source| SubmissionFailure::Response { status, source })?;

        let credit_tx = if status == FlightStatus::LateAirline {
            let tx = self
                .chain
                .credit_insurees(signer, &record.flight)
                .await
                .map_err(|source| SubmissionFailure::Credit { response_tx, source })?;
            Some(tx)
        } else {
            None
        };

        Ok(SubmissionReceipt {
            signer,
            status,
            response_tx,
            credit_tx,
        })
    }
}
