//! FlightSurety Oracle Coordination Library
//!
//! Simulates a pool of oracle identities for the FlightSurety app contract:
//! registers them once at startup, listens for `OracleRequest` events and
//! answers each one from every eligible identity with an operator-chosen status.

pub mod app_state;
pub mod chain;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event_listener;
pub mod handlers;
pub mod matcher;
pub mod models;
pub mod pool;
pub mod routes;
pub mod services;
pub mod status;
