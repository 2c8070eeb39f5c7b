//! API handlers for the oracle coordination server

pub mod oracle;
pub mod status;

pub use oracle::list_oracles;
pub use status::{api_root, set_flight_status};
