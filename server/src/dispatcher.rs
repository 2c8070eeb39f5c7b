//! Fans oracle requests out to the eligible identities
//!
//! Every matched (identity, request) pair becomes its own task. Tasks run
//! concurrently with no ordering between them; each reports its own outcome.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::SubmissionFailure;
use crate::matcher::match_request;
use crate::models::{OracleIdentity, RequestRecord};
use crate::pool::IdentityPool;
use crate::services::{ResponseSubmitter, SubmissionReceipt};

/// Counters for one dispatcher run
#[derive(Debug, Default, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DispatchStats {
    pub requests: usize,
    pub unmatched: usize,
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

type SubmissionOutcome = (OracleIdentity, RequestRecord, Result<SubmissionReceipt, SubmissionFailure>);

pub struct Dispatcher {
    pool: Arc<IdentityPool>,
    submitter: Arc<ResponseSubmitter>,
}

impl Dispatcher {
    pub fn new(pool: Arc<IdentityPool>, submitter: Arc<ResponseSubmitter>) -> Self {
        Self { pool, submitter }
    }

    /// Dispatches requests until the channel closes, then waits for every
    /// in-flight submission to finish.
    pub async fn run(self, mut requests: mpsc::Receiver<RequestRecord>) -> DispatchStats {
        let mut stats = DispatchStats::default();
        let mut in_flight: JoinSet<SubmissionOutcome> = JoinSet::new();

        loop {
            tokio::select! {
                received = requests.recv() => match received {
                    Some(record) => self.dispatch(record, &mut in_flight, &mut stats),
                    None => break,
                },
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    record_outcome(joined, &mut stats);
                }
            }
        }

        if !in_flight.is_empty() {
            info!(in_flight = in_flight.len(), "request stream closed; draining submissions");
        }
        while let Some(joined) = in_flight.join_next().await {
            record_outcome(joined, &mut stats);
        }

        info!(
            requests = stats.requests,
            submitted = stats.submitted,
            succeeded = stats.succeeded,
            failed = stats.failed,
            "dispatcher stopped"
        );
        stats
    }

    fn dispatch(&self, record: RequestRecord, in_flight: &mut JoinSet<SubmissionOutcome>, stats: &mut DispatchStats) {
        stats.requests += 1;

        let matched = match_request(&self.pool, &record);
        if matched.is_empty() {
            stats.unmatched += 1;
            debug!(index = record.index, flight = %record.flight, "no oracle holds this index; dropping request");
            return;
        }

        info!(
            index = record.index,
            flight = %record.flight,
            oracles = matched.len(),
            "dispatching oracle responses"
        );
        for identity in matched {
            stats.submitted += 1;
            let submitter = self.submitter.clone();
            let record = record.clone();
            in_flight.spawn(async move {
                let outcome = submitter.submit(&identity, &record).await;
                (identity, record, outcome)
            });
        }
    }
}

fn record_outcome(joined: Result<SubmissionOutcome, tokio::task::JoinError>, stats: &mut DispatchStats) {
    match joined {
        Ok((identity, record, Ok(receipt))) => {
            stats.succeeded += 1;
            info!(
                signer = ?identity.signer,
                index = record.index,
                flight = %record.flight,
                status = %receipt.status,
                response_tx = ?receipt.response_tx,
                credit_tx = ?receipt.credit_tx,
                "oracle response submitted"
            );
        }
        Ok((identity, record, Err(failure))) => {
            stats.failed += 1;
            warn!(
                signer = ?identity.signer,
                index = record.index,
                flight = %record.flight,
                error = %failure,
                "oracle response failed"
            );
        }
        Err(join_error) => {
            stats.failed += 1;
            error!(error = %join_error, "submission task aborted");
        }
    }
}
