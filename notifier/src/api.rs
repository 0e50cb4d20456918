use crate::events::{DatabaseClient, EventRecord};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct AppState {
    pub service_name: String,
    pub database: DatabaseClient,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/notify", post(notify))
        .with_state(state)
}

/// A note lifecycle event as reported by the backend.
#[derive(Deserialize, Debug)]
pub struct NotifyRequest {
    /// "created" | "updated" | "deleted"
    pub action: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub note_id: i64,
}

impl NotifyRequest {
    /// Human-readable message recorded downstream, e.g.
    /// `note created: shopping list` or `note deleted: note_id=42` when the
    /// note has no title.
    pub fn message(&self) -> String {
        let label = if self.title.is_empty() {
            format!("note_id={}", self.note_id)
        } else {
            self.title.clone()
        };
        format!("note {}: {label}", self.action)
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: String,
}

#[derive(Serialize)]
struct NotifyResponse {
    status: &'static str,
    service: String,
    action: String,
}

#[derive(Serialize)]
struct ApiErrorResponse {
    detail: String,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (StatusCode::BAD_GATEWAY, Json(self)).into_response()
    }
}

async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: state.service_name,
    })
}

/// Record a note lifecycle event in the database service. The downstream call
/// is synchronous so the full backend -> notifier -> database chain shows up
/// in one distributed trace.
async fn notify(
    State(state): State<AppState>,
    Json(request): Json<NotifyRequest>,
) -> Result<Json<NotifyResponse>, ApiErrorResponse> {
    let event = EventRecord {
        source: state.service_name.clone(),
        method: "POST".to_string(),
        route: "/notify".to_string(),
        status: 200,
        message: request.message(),
    };

    if let Err(e) = state.database.record_event(&event).await {
        tracing::warn!(error = %e, "failed to record note event");
        return Err(ApiErrorResponse {
            detail: e.to_string(),
        });
    }

    Ok(Json(NotifyResponse {
        status: "ok",
        service: state.service_name,
        action: request.action,
    }))
}
