//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::pool::IdentityPool;
use crate::status::StatusControl;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub status: StatusControl,
    pub pool: Arc<IdentityPool>,
}

impl AppState {
    pub fn new(status: StatusControl, pool: Arc<IdentityPool>) -> Self {
        Self { status, pool }
    }
}

impl FromRef<AppState> for StatusControl {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.status.clone()
    }
}

impl FromRef<AppState> for Arc<IdentityPool> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.pool.clone()
    }
}
