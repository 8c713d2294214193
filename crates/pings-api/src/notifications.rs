use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::future::try_join_all;
use tracing::info;

use pings_types::api::{Ack, NotificationRequest, SendNotificationResponse};
use pings_types::events::{Destination, Publication, push_message};
use pings_types::models::Platform;

use crate::error::{ApiError, OrInternal};
use crate::extract::JsonBody;
use crate::records;
use crate::state::AppState;
use crate::validate::{self, Required};

const FAILURE: &str = "Failed to process notification request";

/// POST /notifications: `register`, `deregister` or `send`.
pub async fn handle_notification(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<NotificationRequest>,
) -> Result<Response, ApiError> {
    let mut required = Required::new();
    let user_id = required.take("userId", req.user_id);
    let device_token = required.take("deviceToken", req.device_token);
    let platform = required.take("platform", req.platform);
    required.finish()?;

    let platform: Platform = validate::one_of("platform", &platform)?;

    match req.action.as_deref() {
        Some("register") => {
            let token = records::device_token(user_id, device_token, platform);
            state
                .with_store(move |store| store.put_device_token(&token))
                .await
                .or_internal(FAILURE)?;

            Ok((
                StatusCode::CREATED,
                Json(Ack::with_message("Device token registered successfully")),
            )
                .into_response())
        }
        Some("deregister") => {
            state
                .with_store(move |store| store.delete_device_token(&user_id, &device_token))
                .await
                .or_internal(FAILURE)?;

            Ok(Json(Ack::with_message("Device token deregistered")).into_response())
        }
        Some("send") => {
            let mut required = Required::new();
            let title = required.take("title", req.title);
            let message = required.take("message", req.message);
            required.finish()?;

            let sent_count = send_to_devices(&state, user_id, &title, &message).await?;

            Ok(Json(SendNotificationResponse {
                success: true,
                sent_count,
                message: format!("Notification sent to {} devices", sent_count),
            })
            .into_response())
        }
        _ => Err(ApiError::invalid("action", "Invalid action")),
    }
}

/// Publish to every device registered for `user_id`, concurrently.
async fn send_to_devices(
    state: &AppState,
    user_id: String,
    title: &str,
    message: &str,
) -> Result<usize, ApiError> {
    let uid = user_id.clone();
    let tokens = state
        .with_store(move |store| store.device_tokens(&uid))
        .await
        .or_internal(FAILURE)?;

    if tokens.is_empty() {
        return Err(ApiError::NotFound("No device tokens found for user"));
    }

    let sends = tokens.iter().map(|token| {
        let (body, message_structure) = push_message(token.platform, title, message);
        state.notifier.publish(Publication {
            destination: Destination::Device(token.device_token.clone()),
            message: body,
            message_structure,
        })
    });
    try_join_all(sends).await.or_internal(FAILURE)?;

    info!("Notification sent to {} devices of {}", tokens.len(), user_id);
    Ok(tokens.len())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::{Method, StatusCode};
    use serde_json::{Value, json};

    use pings_db::DocumentStore;
    use pings_types::events::{Destination, MessageStructure};

    use crate::state::ApiConfig;
    use crate::test_support::{FailingNotifier, failing_store_app, send, test_app, test_app_with};

    async fn register(app: &axum::Router, token: &str, platform: &str) -> (StatusCode, Value) {
        send(
            app,
            Method::POST,
            "/notifications",
            Some(json!({ "userId": "dad-001", "action": "register", "deviceToken": token, "platform": platform })),
        )
        .await
    }

    fn send_body() -> Value {
        json!({
            "userId": "dad-001",
            "action": "send",
            "deviceToken": "tok-a",
            "platform": "android",
            "title": "Reminder",
            "message": "Time for your pills"
        })
    }

    #[tokio::test]
    async fn register_and_deregister() {
        let t = test_app(ApiConfig::default()).await;

        let (status, body) = register(&t.app, "tok-a", "ios").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({ "success": true, "message": "Device token registered successfully" }));
        assert_eq!(t.db.device_tokens("dad-001").unwrap().len(), 1);

        let (status, body) = send(
            &t.app,
            Method::POST,
            "/notifications",
            Some(json!({ "userId": "dad-001", "action": "deregister", "deviceToken": "tok-a", "platform": "ios" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Device token deregistered");
        assert!(t.db.device_tokens("dad-001").unwrap().is_empty());
    }

    #[tokio::test]
    async fn send_builds_payload_per_platform() {
        let t = test_app(ApiConfig::default()).await;
        register(&t.app, "tok-a", "android").await;
        register(&t.app, "tok-i", "ios").await;
        let mut rx = t.hub.subscribe();

        let (status, body) = send(&t.app, Method::POST, "/notifications", Some(send_body())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sentCount"], 2);
        assert_eq!(body["message"], "Notification sent to 2 devices");

        let mut received = vec![rx.recv().await.unwrap(), rx.recv().await.unwrap()];
        received.sort_by_key(|p| format!("{:?}", p.destination));

        assert_eq!(received[0].destination, Destination::Device("tok-a".into()));
        assert_eq!(received[0].message_structure, MessageStructure::Json);
        let envelope: Value = serde_json::from_str(&received[0].message).unwrap();
        assert_eq!(envelope["notification"]["title"], "Reminder");
        assert_eq!(envelope["data"]["body"], "Time for your pills");

        assert_eq!(received[1].destination, Destination::Device("tok-i".into()));
        assert_eq!(received[1].message_structure, MessageStructure::Default);
        assert_eq!(received[1].message, "Time for your pills");
    }

    #[tokio::test]
    async fn re_registering_does_not_duplicate_sends() {
        let t = test_app(ApiConfig::default()).await;
        register(&t.app, "tok-a", "android").await;
        register(&t.app, "tok-a", "android").await;
        let mut rx = t.hub.subscribe();

        let (status, body) = send(&t.app, Method::POST, "/notifications", Some(send_body())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sentCount"], 1);

        rx.recv().await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_without_devices_is_not_found() {
        let t = test_app(ApiConfig::default()).await;

        let (status, body) = send(&t.app, Method::POST, "/notifications", Some(send_body())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("No device tokens"));
    }

    #[tokio::test]
    async fn send_requires_title_and_message() {
        let t = test_app(ApiConfig::default()).await;

        let (status, body) = send(
            &t.app,
            Method::POST,
            "/notifications",
            Some(json!({ "userId": "dad-001", "action": "send", "deviceToken": "tok-a", "platform": "ios" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields: title, message");
    }

    #[tokio::test]
    async fn publish_failure_is_internal_error() {
        let t = test_app_with(ApiConfig::default(), Arc::new(FailingNotifier)).await;
        register(&t.app, "tok-a", "android").await;

        let (status, body) = send(&t.app, Method::POST, "/notifications", Some(send_body())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to process notification request");
    }

    #[tokio::test]
    async fn rejects_bad_platform_and_action() {
        let t = test_app(ApiConfig::default()).await;

        let (status, body) = register(&t.app, "tok-a", "windows").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid platform. Must be one of: android, ios");

        let (status, body) = send(
            &t.app,
            Method::POST,
            "/notifications",
            Some(json!({ "userId": "dad-001", "action": "subscribe", "deviceToken": "tok-a", "platform": "ios" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid action");

        let (status, _) = send(
            &t.app,
            Method::POST,
            "/notifications",
            Some(json!({ "userId": "dad-001", "deviceToken": "tok-a", "platform": "ios" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn only_post_is_allowed() {
        let t = test_app(ApiConfig::default()).await;

        let (status, _) = send(&t.app, Method::GET, "/notifications", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn store_failure_is_generic() {
        let (app, hub) = failing_store_app(ApiConfig::default()).await;
        let mut rx = hub.subscribe();

        let (status, body) = send(&app, Method::POST, "/notifications", Some(send_body())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Failed to process notification request" }));
        assert!(rx.try_recv().is_err());
    }
}
