use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::Result;
use chrono::DateTime;
use rusqlite::{OptionalExtension, Row, params, types::Type};

use pings_types::models::{CheckIn, DeviceToken, FamilyMember, MedicationLog, Photo, UserProfile};

use crate::Database;
use crate::store::DocumentStore;

impl DocumentStore for Database {
    // -- Check-ins --

    fn put_check_in(&self, checkin: &CheckIn) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO checkins (id, user_id, kind, value, emoji, timestamp, sort_at, sent_to_family)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    checkin.id,
                    checkin.user_id,
                    checkin.kind.as_str(),
                    checkin.value,
                    checkin.emoji,
                    checkin.timestamp,
                    sort_millis(&checkin.timestamp),
                    checkin.sent_to_family,
                ],
            )?;
            Ok(())
        })
    }

    fn recent_check_ins(&self, user_id: &str, limit: u32) -> Result<Vec<CheckIn>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, kind, value, emoji, timestamp, sent_to_family
                 FROM checkins
                 WHERE user_id = ?1
                 ORDER BY sort_at DESC, rowid DESC
                 LIMIT ?2",
            )?;

            let rows = stmt
                .query_map(params![user_id, limit], |row| {
                    Ok(CheckIn {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        kind: parse_column(row, 2)?,
                        value: row.get(3)?,
                        emoji: row.get(4)?,
                        timestamp: row.get(5)?,
                        sent_to_family: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Medications --

    fn put_medication_log(&self, log: &MedicationLog) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO medication_logs (user_id, medication_id, action, timestamp, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![log.user_id, log.medication_id, log.action.as_str(), log.timestamp, log.notes],
            )?;
            Ok(())
        })
    }

    // -- Photos --

    fn put_photo(&self, photo: &Photo) -> Result<()> {
        let metadata = photo.metadata.as_ref().map(serde_json::to_string).transpose()?;

        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO photos
                    (photo_id, user_id, filename, content_type, storage_key, created_at, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    photo.photo_id,
                    photo.user_id,
                    photo.filename,
                    photo.content_type,
                    photo.storage_key,
                    photo.created_at,
                    metadata,
                ],
            )?;
            Ok(())
        })
    }

    fn get_photo(&self, photo_id: &str) -> Result<Option<Photo>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT photo_id, user_id, filename, content_type, storage_key, created_at, metadata
                     FROM photos WHERE photo_id = ?1",
                    [photo_id],
                    |row| {
                        Ok(Photo {
                            photo_id: row.get(0)?,
                            user_id: row.get(1)?,
                            filename: row.get(2)?,
                            content_type: row.get(3)?,
                            storage_key: row.get(4)?,
                            created_at: row.get(5)?,
                            metadata: json_column::<BTreeMap<String, String>>(row, 6)?,
                        })
                    },
                )
                .optional()?;

            Ok(row)
        })
    }

    fn delete_photo(&self, photo_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM photos WHERE photo_id = ?1", [photo_id])?;
            Ok(())
        })
    }

    // -- Users --

    fn put_user(&self, user: &UserProfile) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO users (user_id, name, role, avatar, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user.user_id, user.name, user.role.as_str(), user.avatar, user.created_at],
            )?;
            Ok(())
        })
    }

    fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT user_id, name, role, avatar, created_at FROM users WHERE user_id = ?1",
                    [user_id],
                    |row| {
                        Ok(UserProfile {
                            user_id: row.get(0)?,
                            name: row.get(1)?,
                            role: parse_column(row, 2)?,
                            avatar: row.get(3)?,
                            created_at: row.get(4)?,
                        })
                    },
                )
                .optional()?;

            Ok(row)
        })
    }

    // -- Family circles --

    fn put_family_member(&self, member: &FamilyMember) -> Result<()> {
        let device_tokens = member.device_tokens.as_ref().map(serde_json::to_string).transpose()?;

        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO family_members
                    (family_id, user_id, name, role, avatar, device_tokens, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    member.family_id,
                    member.user_id,
                    member.name,
                    member.role.as_str(),
                    member.avatar,
                    device_tokens,
                    member.created_at,
                ],
            )?;
            Ok(())
        })
    }

    fn delete_family_member(&self, family_id: &str, user_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM family_members WHERE family_id = ?1 AND user_id = ?2",
                [family_id, user_id],
            )?;
            Ok(())
        })
    }

    // -- Device tokens --

    fn put_device_token(&self, token: &DeviceToken) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO device_tokens (user_id, device_token, platform, created_at, last_used)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    token.user_id,
                    token.device_token,
                    token.platform.as_str(),
                    token.created_at,
                    token.last_used,
                ],
            )?;
            Ok(())
        })
    }

    fn delete_device_token(&self, user_id: &str, device_token: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM device_tokens WHERE user_id = ?1 AND device_token = ?2",
                [user_id, device_token],
            )?;
            Ok(())
        })
    }

    fn device_tokens(&self, user_id: &str) -> Result<Vec<DeviceToken>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, device_token, platform, created_at, last_used
                 FROM device_tokens WHERE user_id = ?1
                 ORDER BY created_at",
            )?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(DeviceToken {
                        user_id: row.get(0)?,
                        device_token: row.get(1)?,
                        platform: parse_column(row, 2)?,
                        created_at: row.get(3)?,
                        last_used: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

/// Read a TEXT column holding one of the model enums.
fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(idx)?;
    text.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a nullable TEXT column holding JSON.
fn json_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: serde::de::DeserializeOwned,
{
    let text: Option<String> = row.get(idx)?;
    text.map(|t| {
        serde_json::from_str(&t)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

/// Ordering key for a stored timestamp. The text is kept exactly as the
/// caller sent it, so mixed precisions and offsets sort by instant here.
fn sort_millis(timestamp: &str) -> i64 {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|t| t.timestamp_millis())
        .unwrap_or_default()
}
