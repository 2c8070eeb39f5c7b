//! Operator-controlled simulated flight status

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::models::FlightStatus;

/// Shared handle to the status every oracle reports next.
///
/// Cloning shares the cell. Submitters read it when they send, so a change
/// applies to every submission that has not yet read its value.
#[derive(Debug, Clone)]
pub struct StatusControl {
    cell: Arc<AtomicU8>,
}

impl StatusControl {
    pub fn new(initial: FlightStatus) -> Self {
        Self {
            cell: Arc::new(AtomicU8::new(initial.code())),
        }
    }

    pub fn current(&self) -> FlightStatus {
        FlightStatus::from_code(self.cell.load(Ordering::Relaxed))
    }

    pub fn set(&self, status: FlightStatus) {
        self.cell.store(status.code(), Ordering::Relaxed);
    }

    /// Sets the status from a raw code string; anything unrecognized becomes `Unknown`.
    pub fn set_from_code(&self, code: &str) -> FlightStatus {
        let status = FlightStatus::from_param(code);
        self.set(status);
        status
    }
}

impl Default for StatusControl {
    fn default() -> Self {
        Self::new(FlightStatus::OnTime)
    }
}
