use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::info;

use pings_types::api::{Ack, FamilyQuery, FamilyRequest, FamilyStatusResponse, JoinFamilyResponse};
use pings_types::models::Role;

use crate::error::{ApiError, OrInternal};
use crate::extract::JsonBody;
use crate::records;
use crate::state::AppState;
use crate::validate::{self, Required};

const FAILURE: &str = "Failed to process family request";

/// How many check-ins the dashboard shows.
pub const RECENT_CHECKINS: u32 = 10;

/// GET /family?userId=: profile and latest check-ins for the dashboard.
pub async fn family_status(
    State(state): State<AppState>,
    Query(query): Query<FamilyQuery>,
) -> Result<Json<FamilyStatusResponse>, ApiError> {
    let mut required = Required::new();
    let user_id = required.take("userId", query.user_id);
    required.finish()?;

    let found = state
        .with_store(move |store| {
            let Some(user) = store.get_user(&user_id)? else {
                return Ok(None);
            };
            let recent = store.recent_check_ins(&user_id, RECENT_CHECKINS)?;
            Ok(Some((user, recent)))
        })
        .await
        .or_internal(FAILURE)?;

    let (user, recent_checkins) = found.ok_or(ApiError::NotFound("User not found"))?;
    Ok(Json(FamilyStatusResponse { user, recent_checkins }))
}

/// POST /family: `join` or `leave` a family circle.
pub async fn update_membership(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<FamilyRequest>,
) -> Result<Response, ApiError> {
    let mut required = Required::new();
    let user_id = required.take("userId", req.user_id);
    let family_id = required.take("familyId", req.family_id);
    let action = required.take("action", req.action);
    required.finish()?;

    match action.as_str() {
        "join" => {
            let member = req.member.ok_or_else(|| ApiError::MissingFields(vec!["member"]))?;

            let mut required = Required::new();
            let name = required.take("member.name", member.name);
            let role = required.take("member.role", member.role);
            required.finish()?;
            let role: Role = validate::one_of("member.role", &role)?;

            let member = records::family_member(
                family_id,
                user_id,
                name,
                role,
                validate::non_empty(member.avatar),
                member.device_tokens,
            );

            let row = member.clone();
            state
                .with_store(move |store| store.put_family_member(&row))
                .await
                .or_internal(FAILURE)?;

            info!("{} joined family {}", member.user_id, member.family_id);

            Ok((
                StatusCode::CREATED,
                Json(JoinFamilyResponse {
                    success: true,
                    member,
                    message: "Joined family circle successfully".into(),
                }),
            )
                .into_response())
        }
        "leave" => {
            let (family, user) = (family_id.clone(), user_id.clone());
            state
                .with_store(move |store| store.delete_family_member(&family, &user))
                .await
                .or_internal(FAILURE)?;

            info!("{} left family {}", user_id, family_id);

            Ok(Json(Ack::with_message("Left family circle")).into_response())
        }
        _ => Err(ApiError::invalid("action", "Invalid action")),
    }
}
