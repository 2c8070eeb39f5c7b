//! Event listener for FlightSurety contract logs
//!
//! Polls `OracleRequest` events from the app contract and forwards each one to
//! the dispatcher, and logs every change notification from the data contract.
//! Transport errors are logged and polling continues. Redelivered events are
//! forwarded again; nothing here deduplicates. A poll in flight is abandoned
//! as soon as shutdown is requested.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::chain::{BlockRange, FlightSuretyChain};
use crate::config::{EventsConfig, StartBlock};
use crate::error::TransportFailure;
use crate::models::RequestRecord;

const MAX_BLOCKS_PER_POLL: u64 = 500;

/// Next unread block for one log stream.
#[derive(Debug)]
struct LogCursor {
    start: StartBlock,
    next: Option<u64>,
}

impl LogCursor {
    fn new(start: StartBlock) -> Self {
        Self { start, next: None }
    }

    /// The range to fetch next, or `None` when caught up with the chain head.
    async fn next_range(&mut self, chain: &dyn FlightSuretyChain) -> Result<Option<BlockRange>, TransportFailure> {
        let latest = chain.block_number().await.map_err(|source| TransportFailure {
            stage: "eth_blockNumber",
            source,
        })?;

        let start = self.start;
        let next = *self.next.get_or_insert_with(|| match start {
            StartBlock::Genesis => 0,
            StartBlock::Latest => latest,
        });
        if next > latest {
            return Ok(None);
        }

        Ok(Some(BlockRange {
            from: next,
            to: latest.min(next + MAX_BLOCKS_PER_POLL - 1),
        }))
    }

    fn advance(&mut self, range: BlockRange) {
        self.next = Some(range.to + 1);
    }
}

pub struct EventListener {
    chain: Arc<dyn FlightSuretyChain>,
    config: EventsConfig,
    requests: mpsc::Sender<RequestRecord>,
}

impl EventListener {
    pub fn new(chain: Arc<dyn FlightSuretyChain>, config: EventsConfig, requests: mpsc::Sender<RequestRecord>) -> Self {
        Self {
            chain,
            config,
            requests,
        }
    }

    /// Runs both log streams until `shutdown` flips to true. Dropping the
    /// listener afterwards closes the request channel.
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        info!(from_block = ?self.config.from_block, "starting event listener");
        tokio::join!(
            self.watch_requests(shutdown.clone()),
            self.watch_data_events(shutdown)
        );
        info!("event listener stopped");
    }

    async fn watch_requests(&self, mut shutdown: watch::Receiver<bool>) {
        let mut cursor = LogCursor::new(self.config.from_block);

        while !*shutdown.borrow() {
            let polled = tokio::select! {
                polled = self.poll_requests(&mut cursor) => polled,
                _ = shutdown.changed() => return,
            };
            match polled {
                Ok(true) => {}
                Ok(false) => {
                    warn!("request channel closed; no longer forwarding OracleRequest events");
                    return;
                }
                Err(failure) => {
                    warn!(error = %failure, "OracleRequest poll failed; still listening");
                }
            }

            if wait_or_shutdown(&mut shutdown, self.config.poll_interval).await {
                return;
            }
        }
    }

    /// Returns `Ok(false)` once nobody is receiving requests anymore.
    async fn poll_requests(&self, cursor: &mut LogCursor) -> Result<bool, TransportFailure> {
        let Some(range) = cursor.next_range(self.chain.as_ref()).await? else {
            return Ok(true);
        };

        let records = self
            .chain
            .oracle_requests(range)
            .await
            .map_err(|source| TransportFailure {
                stage: "eth_getLogs(OracleRequest)",
                source,
            })?;
        debug!(from = range.from, to = range.to, events = records.len(), "polled OracleRequest events");

        for record in records {
            info!(
                index = record.index,
                airline = ?record.airline,
                flight = %record.flight,
                timestamp = %record.timestamp,
                block = ?record.block_number,
                "oracle request received"
            );
            if self.requests.send(record).await.is_err() {
                return Ok(false);
            }
        }

        cursor.advance(range);
        Ok(true)
    }

    async fn watch_data_events(&self, mut shutdown: watch::Receiver<bool>) {
        let mut cursor = LogCursor::new(self.config.from_block);

        while !*shutdown.borrow() {
            let polled = tokio::select! {
                polled = self.poll_data_events(&mut cursor) => polled,
                _ = shutdown.changed() => return,
            };
            if let Err(failure) = polled {
                warn!(error = %failure, "data contract poll failed; still listening");
            }

            if wait_or_shutdown(&mut shutdown, self.config.poll_interval).await {
                return;
            }
        }
    }

    async fn poll_data_events(&self, cursor: &mut LogCursor) -> Result<(), TransportFailure> {
        let Some(range) = cursor.next_range(self.chain.as_ref()).await? else {
            return Ok(());
        };

        let logs = self
            .chain
            .data_contract_logs(range)
            .await
            .map_err(|source| TransportFailure {
                stage: "eth_getLogs(data contract)",
                source,
            })?;

        for log in logs {
            info!(
                topic = ?log.topics.first(),
                block = ?log.block_number,
                tx_hash = ?log.transaction_hash,
                "data contract event"
            );
        }

        cursor.advance(range);
        Ok(())
    }
}

/// Sleeps for `interval`; returns true if shutdown was requested meanwhile.
async fn wait_or_shutdown(shutdown: &mut watch::Receiver<bool>, interval: Duration) -> bool {
    let sender_gone = tokio::select! {
        _ = sleep(interval) => false,
        changed = shutdown.changed() => changed.is_err(),
    };
    sender_gone || *shutdown.borrow()
}
