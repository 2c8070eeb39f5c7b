use axum::{extract::Path, extract::State, Json};
use tracing::info;

use crate::models::MessageResponse;
use crate::status::StatusControl;

pub async fn api_root() -> Json<MessageResponse> {
    Json(MessageResponse::new("An API for use with your Dapp!"))
}

/// Sets the status every oracle reports from now on. Unrecognized codes select UNKNOWN.
pub async fn set_flight_status(
    State(status): State<StatusControl>,
    Path(code): Path<String>,
) -> Json<MessageResponse> {
    let previous = status.current();
    let selected = status.set_from_code(&code);
    info!(requested = %code, %previous, status = %selected, "simulated flight status changed");

    Json(MessageResponse::new(format!("Status changed to: {}", selected.label())))
}
