//! Record builders: request fields plus server-generated ids and timestamps.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use pings_types::models::{
    CheckIn, CheckInType, DeviceToken, FamilyMember, MedicationAction, MedicationLog, Photo,
    Platform, Role, UserProfile,
};

use crate::error::ApiError;

/// Request-processing time in the stored timestamp format.
pub fn now_iso() -> String {
    format_timestamp(Utc::now())
}

pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Caller-supplied timestamp, kept exactly as sent, or now when absent.
///
/// A supplied value must still be RFC 3339 so stored rows can be ordered by
/// instant.
pub fn timestamp_or_now(supplied: Option<String>) -> Result<String, ApiError> {
    match supplied.filter(|t| !t.is_empty()) {
        None => Ok(now_iso()),
        Some(text) => match DateTime::parse_from_rfc3339(&text) {
            Ok(_) => Ok(text),
            Err(_) => Err(ApiError::invalid("timestamp", "Invalid timestamp. Expected RFC 3339")),
        },
    }
}

/// Millisecond clock that never repeats a value, so two check-ins from the
/// same user in the same millisecond still get distinct ids.
#[derive(Debug, Default)]
pub struct IdClock {
    last: AtomicI64,
}

impl IdClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_millis(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let prev = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| Some(now.max(last + 1)))
            .unwrap_or_else(|last| last);
        now.max(prev + 1)
    }
}

pub fn check_in(
    clock: &IdClock,
    user_id: String,
    kind: CheckInType,
    value: String,
    emoji: Option<String>,
    timestamp: String,
) -> CheckIn {
    CheckIn {
        id: format!("{}-{}", user_id, clock.next_millis()),
        user_id,
        kind,
        value,
        emoji,
        timestamp,
        sent_to_family: false,
    }
}

pub fn medication_log(
    user_id: String,
    medication_id: String,
    action: MedicationAction,
    timestamp: String,
    notes: Option<String>,
) -> MedicationLog {
    MedicationLog {
        user_id,
        medication_id,
        action,
        timestamp,
        notes,
    }
}

pub fn storage_key(user_id: &str, photo_id: &str, filename: &str) -> String {
    format!("photos/{}/{}-{}", user_id, photo_id, filename)
}

pub fn photo(
    user_id: String,
    photo_id: Option<String>,
    filename: String,
    content_type: String,
    metadata: Option<BTreeMap<String, String>>,
) -> Photo {
    let photo_id = photo_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    Photo {
        storage_key: storage_key(&user_id, &photo_id, &filename),
        photo_id,
        user_id,
        filename,
        content_type,
        created_at: now_iso(),
        metadata,
    }
}

pub fn family_member(
    family_id: String,
    user_id: String,
    name: String,
    role: Role,
    avatar: Option<String>,
    device_tokens: Option<Vec<String>>,
) -> FamilyMember {
    FamilyMember {
        family_id,
        user_id,
        name,
        role,
        avatar,
        device_tokens,
        created_at: now_iso(),
    }
}

pub fn device_token(user_id: String, device_token: String, platform: Platform) -> DeviceToken {
    let now = now_iso();
    DeviceToken {
        user_id,
        device_token,
        platform,
        created_at: now.clone(),
        last_used: now,
    }
}

pub fn user_profile(user_id: String, name: String, role: Role, avatar: Option<String>) -> UserProfile {
    UserProfile {
        user_id,
        name,
        role,
        avatar,
        created_at: now_iso(),
    }
}
