//! HTTP request handlers

use super::types::ErrorResponse;
use super::AppState;
use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::services::ServeDir;
use tracing::warn;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        // Skill webhook; GET / still serves the static index
        .route(
            "/",
            post(handle_skill_request).get_service(static_files.clone()),
        )
        .route("/version", get(get_version))
        // Everything else is a static asset
        .fallback_service(static_files)
        .with_state(state)
}

// ============================================================
// Skill Webhook
// ============================================================

async fn handle_skill_request(
    State(state): State<AppState>,
    payload: Result<Json<RequestEnvelope>, JsonRejection>,
) -> Result<Json<ResponseEnvelope>, AppError> {
    let Json(envelope) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected request envelope");
        AppError::from(rejection)
    })?;

    Ok(Json(state.runtime.handle(&envelope)))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("tuner-skill ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    UnsupportedMediaType(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::UNSUPPORTED_MEDIA_TYPE {
            AppError::UnsupportedMediaType(rejection.body_text())
        } else {
            AppError::BadRequest(rejection.body_text())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::UnsupportedMediaType(msg) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::SkillRuntime;
    use crate::session::InMemorySessionStore;
    use crate::skill::Skill;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use std::path::Path;
    use std::sync::Arc;
    use tower::ServiceExt;
    use url::Url;

    fn app(static_dir: &Path) -> Router {
        let skill = Skill::tuner(Url::parse("https://audio.example.com/audio/").unwrap());
        let runtime = SkillRuntime::new(Arc::new(skill), Arc::new(InMemorySessionStore::new()));
        create_router(AppState::new(runtime, static_dir.to_path_buf()))
    }

    fn post_json(body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_launch_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path())
            .oneshot(post_json(&json!({
                "version": "1.0",
                "session": {"new": true, "sessionId": "s-1", "attributes": {}},
                "request": {"type": "LaunchRequest", "requestId": "r-1"}
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["version"], "1.0");
        assert_eq!(
            body["response"]["outputSpeech"]["ssml"],
            "<speak>Welcome to My Guitar Tuner. Please tell me which string you would like to tune.</speak>"
        );
        assert_eq!(body["response"]["shouldEndSession"], false);
    }

    #[tokio::test]
    async fn test_session_state_spans_requests() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        let choose = json!({
            "session": {"new": false, "sessionId": "s-9"},
            "request": {
                "type": "IntentRequest",
                "intent": {
                    "name": "ChooseString",
                    "slots": {"guitar_string": {"name": "guitar_string", "value": "low E"}}
                }
            }
        });
        let response = app.clone().oneshot(post_json(&choose)).await.unwrap();
        assert_eq!(
            body_json(response).await["response"]["outputSpeech"]["ssml"],
            "<speak>The string you want to tune is low E.</speak>"
        );

        let help = json!({
            "session": {"new": false, "sessionId": "s-9"},
            "request": {"type": "IntentRequest", "intent": {"name": "AMAZON.HelpIntent"}}
        });
        let body = body_json(app.oneshot(post_json(&help)).await.unwrap()).await;
        assert!(body["response"]["outputSpeech"]["ssml"]
            .as_str()
            .unwrap()
            .contains("you have selected the low E string"));
    }

    #[tokio::test]
    async fn test_null_attributes_and_slots_reach_the_skill() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path())
            .oneshot(post_json(&json!({
                "version": "1.0",
                "session": {"new": false, "sessionId": "s-4", "attributes": null},
                "request": {
                    "type": "IntentRequest",
                    "intent": {"name": "ChooseString", "slots": null}
                }
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(
            body["response"]["outputSpeech"]["ssml"],
            "<speak>Please tell me which string you would like to tune.</speak>"
        );
    }

    #[tokio::test]
    async fn test_malformed_envelope_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app(dir.path()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_envelope_without_request_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path())
            .oneshot(post_json(&json!({"version": "1.0"})))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_missing_content_type_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from("{}"))
            .unwrap();

        let response = app(dir.path()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_static_files_are_served() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>tuner</h1>").unwrap();
        std::fs::write(dir.path().join("E.txt"), "reference").unwrap();

        let app = app(dir.path());
        let index = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(index.status(), StatusCode::OK);
        let bytes = to_bytes(index.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>tuner</h1>");

        let asset = app
            .clone()
            .oneshot(Request::builder().uri("/E.txt").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(asset.status(), StatusCode::OK);

        let missing = app
            .oneshot(Request::builder().uri("/nope.mp3").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_version() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path())
            .oneshot(Request::builder().uri("/version").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).starts_with("tuner-skill "));
    }
}
