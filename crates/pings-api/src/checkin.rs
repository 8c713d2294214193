use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{error, info};

use pings_types::api::CheckInRequest;
use pings_types::events::{Destination, FamilyAlert, MessageStructure, Publication};
use pings_types::models::{CheckIn, CheckInType};

use crate::error::{ApiError, OrInternal};
use crate::extract::JsonBody;
use crate::records;
use crate::state::AppState;
use crate::validate::{self, Required};

const FAILURE: &str = "Failed to process checkin";

/// POST /checkin: store a check-in and alert the family topic if one is set.
///
/// The row is written before the alert goes out. A failed alert does not undo
/// the write; the response then says `sentToFamily: false`.
pub async fn create_check_in(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CheckInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut required = Required::new();
    let user_id = required.take("userId", req.user_id);
    let kind = required.take("type", req.kind);
    let value = required.take("value", req.value);
    required.finish()?;

    let kind: CheckInType = validate::one_of("type", &kind)?;
    let timestamp = records::timestamp_or_now(req.timestamp)?;

    let mut checkin = records::check_in(
        &state.clock,
        user_id,
        kind,
        value,
        validate::non_empty(req.emoji),
        timestamp,
    );

    let row = checkin.clone();
    state
        .with_store(move |store| store.put_check_in(&row))
        .await
        .or_internal(FAILURE)?;

    info!("Check-in {} stored ({})", checkin.id, checkin.kind);

    if let Some(topic) = &state.config.family_topic {
        match alert_family(&state, topic, &checkin).await {
            Ok(()) => checkin.sent_to_family = true,
            Err(e) => error!("Check-in {} stored but family alert failed: {:#}", checkin.id, e),
        }
    }

    Ok((StatusCode::CREATED, Json(checkin)))
}

async fn alert_family(state: &AppState, topic: &str, checkin: &CheckIn) -> anyhow::Result<()> {
    let alert = FamilyAlert::Checkin {
        user_id: checkin.user_id.clone(),
        value: checkin.value.clone(),
        emoji: checkin.emoji.clone(),
        timestamp: checkin.timestamp.clone(),
    };

    state
        .notifier
        .publish(Publication {
            destination: Destination::Topic(topic.to_string()),
            message: serde_json::to_string(&alert)?,
            message_structure: MessageStructure::Default,
        })
        .await
}
