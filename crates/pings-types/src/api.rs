use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{CheckIn, FamilyMember, MedicationLog, Photo, UserProfile};

// Request bodies keep every field optional so that a missing field is reported
// by name instead of failing deserialization as a whole.

// -- Check-ins --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub value: Option<String>,
    pub emoji: Option<String>,
    pub timestamp: Option<String>,
}

// -- Medications --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRequest {
    pub user_id: Option<String>,
    pub medication_id: Option<String>,
    pub action: Option<String>,
    pub timestamp: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MedicationResponse {
    pub success: bool,
    pub log: MedicationLog,
    pub message: String,
}

// -- Photos --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRequest {
    pub user_id: Option<String>,
    pub photo_id: Option<String>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub metadata: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoUploadResponse {
    pub photo_id: String,
    pub upload_url: String,
    pub expires_in: u64,
}

/// Stored photo metadata plus a fresh download URL.
#[derive(Debug, Serialize)]
pub struct PhotoResponse {
    #[serde(flatten)]
    pub photo: Photo,
    pub url: String,
}

// -- Family --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyRequest {
    pub user_id: Option<String>,
    pub family_id: Option<String>,
    pub action: Option<String>,
    pub member: Option<MemberInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    pub name: Option<String>,
    pub role: Option<String>,
    pub avatar: Option<String>,
    pub device_tokens: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyStatusResponse {
    pub user: UserProfile,
    pub recent_checkins: Vec<CheckIn>,
}

#[derive(Debug, Serialize)]
pub struct JoinFamilyResponse {
    pub success: bool,
    pub member: FamilyMember,
    pub message: String,
}

// -- Notifications --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub user_id: Option<String>,
    pub action: Option<String>,
    pub device_token: Option<String>,
    pub platform: Option<String>,
    pub message: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationResponse {
    pub success: bool,
    pub sent_count: usize,
    pub message: String,
}

// -- Users --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileRequest {
    pub name: Option<String>,
    pub role: Option<String>,
    pub avatar: Option<String>,
}

// -- Shared --

/// `{ "success": true }` with an optional human readable message.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Self { success: true, message: None }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self { success: true, message: Some(message.into()) }
    }
}
