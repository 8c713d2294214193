use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use pings_types::api::{MedicationRequest, MedicationResponse};
use pings_types::models::MedicationAction;

use crate::error::{ApiError, OrInternal};
use crate::extract::JsonBody;
use crate::records;
use crate::state::AppState;
use crate::validate::{self, Required};

const FAILURE: &str = "Failed to process medication log";

/// Confirmation shown to the senior after logging.
pub fn action_message(action: &str) -> &'static str {
    match action {
        "taken" => "Great job! Medication logged.",
        "skipped" => "Noted. Skipped medication logged.",
        "refill" => "Refill logged. Don't forget to reorder!",
        "log" => "Medication log entry saved.",
        _ => "Medication action recorded.",
    }
}

/// POST /medications: append one medication log entry.
pub async fn log_medication(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<MedicationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut required = Required::new();
    let user_id = required.take("userId", req.user_id);
    let medication_id = required.take("medicationId", req.medication_id);
    let action = required.take("action", req.action);
    required.finish()?;

    let action: MedicationAction = validate::one_of("action", &action)?;
    let timestamp = records::timestamp_or_now(req.timestamp)?;

    let log = records::medication_log(user_id, medication_id, action, timestamp, validate::non_empty(req.notes));

    let row = log.clone();
    state
        .with_store(move |store| store.put_medication_log(&row))
        .await
        .or_internal(FAILURE)?;

    info!("Medication {} {} for {}", log.medication_id, log.action, log.user_id);

    Ok((
        StatusCode::CREATED,
        Json(MedicationResponse {
            success: true,
            message: action_message(log.action.as_str()).to_string(),
            log,
        }),
    ))
}
