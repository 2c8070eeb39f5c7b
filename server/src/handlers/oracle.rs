use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::app_state::AppState;
use crate::models::FlightStatus;
use crate::pool::{EntrySnapshot, EntryState, IdentityPool};

/// Provisioning report for operators
#[derive(Debug, Serialize)]
pub struct OraclesReport {
    pub current_status: FlightStatus,
    pub index_max: u8,
    pub assigned: usize,
    pub failed: usize,
    pub pending: usize,
    pub oracles: Vec<EntrySnapshot>,
}

impl OraclesReport {
    fn build(pool: &Arc<IdentityPool>, current_status: FlightStatus) -> Self {
        let oracles = pool.snapshot();
        let count = |wanted: fn(&EntryState) -> bool| oracles.iter().filter(|entry| wanted(&entry.state)).count();

        Self {
            current_status,
            index_max: pool.index_max(),
            assigned: count(|state| matches!(state, EntryState::Assigned { .. })),
            failed: count(|state| matches!(state, EntryState::Failed { .. })),
            pending: count(|state| matches!(state, EntryState::Pending)),
            oracles,
        }
    }
}

pub async fn list_oracles(State(app_state): State<AppState>) -> Json<OraclesReport> {
    Json(OraclesReport::build(&app_state.pool, app_state.status.current()))
}
