use serde::{Deserialize, Serialize};

use crate::models::Platform;

/// Where a publication is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "lowercase")]
pub enum Destination {
    /// Fan-out topic, e.g. the family alert topic.
    Topic(String),
    /// A single registered device, addressed by its push token.
    Device(String),
}

/// How the transport should interpret `Publication::message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStructure {
    /// Plain text, delivered as-is.
    Default,
    /// A JSON document the transport unpacks per platform.
    Json,
}

/// One message handed to the notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    pub destination: Destination,
    pub message: String,
    pub message_structure: MessageStructure,
}

/// Alerts published to the family topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum FamilyAlert {
    /// A senior sent a check-in.
    Checkin {
        user_id: String,
        value: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        emoji: Option<String>,
        timestamp: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushContent {
    pub title: String,
    pub body: String,
}

/// Android push envelope: the same content as a visible notification and as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AndroidPush {
    pub notification: PushContent,
    pub data: PushContent,
}

/// Build the per-platform push message for one device.
///
/// Android devices get a JSON envelope, iOS devices the bare message text.
pub fn push_message(platform: Platform, title: &str, message: &str) -> (String, MessageStructure) {
    match platform {
        Platform::Android => {
            let content = PushContent {
                title: title.to_string(),
                body: message.to_string(),
            };
            let envelope = AndroidPush {
                notification: content.clone(),
                data: content,
            };
            // Serializing plain strings cannot fail.
            let json = serde_json::to_string(&envelope).unwrap_or_default();
            (json, MessageStructure::Json)
        }
        Platform::Ios => (message.to_string(), MessageStructure::Default),
    }
}
