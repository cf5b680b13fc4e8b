//! Axum router and handlers for the task API
//!
//! Each handler applies its access-gate policy explicitly before touching
//! the store. Listing and reading a single todo are conditional (gated
//! only while private mode is on); every other operation, including both
//! private-mode endpoints, always requires the token.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use todofile_core::{AuthError, ImportRequest, TodoError, TodoPatch};
use todofile_store::TodoStore;

use crate::auth::AuthGate;

/// Shared application state
pub struct AppState {
    pub store: TodoStore,
    pub gate: AuthGate,
    pub page_title: String,
    pub show_admin_panel: bool,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    fn authenticate(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        self.gate.authenticate(presented)
    }

    /// Mandatory policy: always authenticate.
    fn require_auth(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        Ok(self.authenticate(headers)?)
    }

    /// Conditional policy: authenticate only while private mode is on.
    async fn require_auth_if_private(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        if self.store.private_mode().await {
            self.authenticate(headers)?;
        }
        Ok(())
    }
}

/// Build the full application router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/admin/", get(admin))
        .route("/api/health", get(health))
        .route("/api/todos", get(list_todos).post(create_todo))
        .route("/api/todos/export", get(export_todos))
        .route("/api/todos/import", post(import_todos))
        .route(
            "/api/todos/:id",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .route(
            "/api/private-mode",
            get(get_private_mode).post(set_private_mode),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Error wrapper mapping the store/auth taxonomy onto HTTP statuses
pub struct ApiError(TodoError);

impl From<TodoError> for ApiError {
    fn from(err: TodoError) -> Self {
        Self(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(TodoError::Auth(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            TodoError::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            TodoError::NotFound(_) => (StatusCode::NOT_FOUND, "Todo not found".to_string()),
            TodoError::Auth(AuthError::ServerMisconfigured) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                AuthError::ServerMisconfigured.to_string(),
            ),
            TodoError::Auth(err) => (StatusCode::UNAUTHORIZED, err.to_string()),
            // Storage failures are handled inside the store; reaching here
            // would be a bug, but map it to a 500 rather than panic.
            TodoError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
struct CreateTodoRequest {
    title: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    completed: bool,
}

#[derive(Debug, Default, Deserialize)]
struct PrivateModeRequest {
    enabled: Option<bool>,
}

/// GET /api/todos - full list (conditional policy)
async fn list_todos(
    State(app): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    app.require_auth_if_private(&headers).await?;
    let todos = app.store.list_all().await;
    Ok(Json(json!({ "todos": todos })))
}

/// POST /api/todos - create (mandatory policy, 201 on success)
async fn create_todo(
    State(app): State<SharedState>,
    headers: HeaderMap,
    payload: Option<Json<CreateTodoRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    app.require_auth(&headers)?;

    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let title = request.title.unwrap_or_default();
    let todo = app
        .store
        .create(&title, &request.description, request.completed)
        .await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

/// GET /api/todos/:id - single todo (conditional policy)
async fn get_todo(
    State(app): State<SharedState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    app.require_auth_if_private(&headers).await?;
    Ok(Json(app.store.get(id).await?))
}

/// PUT /api/todos/:id - partial update (mandatory policy)
async fn update_todo(
    State(app): State<SharedState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    payload: Option<Json<TodoPatch>>,
) -> Result<impl IntoResponse, ApiError> {
    app.require_auth(&headers)?;
    let patch = payload.map(|Json(body)| body).unwrap_or_default();
    Ok(Json(app.store.update(id, &patch).await?))
}

/// DELETE /api/todos/:id (mandatory policy)
async fn delete_todo(
    State(app): State<SharedState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    app.require_auth(&headers)?;
    app.store.delete(id).await?;
    Ok(Json(json!({ "message": "Todo deleted successfully" })))
}

/// GET /api/todos/export - downloadable snapshot (mandatory policy)
async fn export_todos(
    State(app): State<SharedState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    app.require_auth(&headers)?;

    let document = app.store.export().await;
    let filename = format!(
        "todofile-export-{}.json",
        document.exported_at.format("%Y%m%d-%H%M%S")
    );
    let disposition = [(
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{filename}\""),
    )];
    Ok((disposition, Json(document)))
}

/// POST /api/todos/import - wholesale replacement (mandatory policy)
async fn import_todos(
    State(app): State<SharedState>,
    headers: HeaderMap,
    payload: Option<Json<ImportRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    app.require_auth(&headers)?;
    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let summary = app.store.import(request).await?;
    Ok(Json(summary))
}

/// GET /api/private-mode (mandatory policy, matching its sibling write)
async fn get_private_mode(
    State(app): State<SharedState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    app.require_auth(&headers)?;
    Ok(Json(json!({ "private_mode": app.store.private_mode().await })))
}

/// POST /api/private-mode - toggle the flag (mandatory policy)
async fn set_private_mode(
    State(app): State<SharedState>,
    headers: HeaderMap,
    payload: Option<Json<PrivateModeRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    app.require_auth(&headers)?;

    let enabled = payload.and_then(|Json(body)| body.enabled).ok_or_else(|| {
        TodoError::Validation("Missing \"enabled\" field in request body".to_string())
    })?;
    Ok(Json(app.store.set_private_mode(enabled).await))
}

/// GET /api/health
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "todofile"
    }))
}

/// Landing page. The API is the real surface; this just names the
/// endpoints and, when enabled, links to the admin panel.
async fn index(State(app): State<SharedState>) -> Html<String> {
    let admin_link = if app.show_admin_panel {
        r#"<p><a href="/admin/">Admin panel</a></p>"#
    } else {
        ""
    };
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>{title}</title></head>
<body>
    <h1>{title}</h1>
    <p>Task API served under <code>/api/todos</code>.</p>
    {admin_link}
</body>
</html>"#,
        title = app.page_title,
        admin_link = admin_link,
    ))
}

/// Admin page: export/import and private-mode live here for humans with
/// the token; the endpoints themselves do the enforcement.
async fn admin(State(app): State<SharedState>) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>{title} - Admin</title></head>
<body>
    <h1>{title} - Admin</h1>
    <ul>
        <li><code>GET /api/todos/export</code> - download the collection</li>
        <li><code>POST /api/todos/import</code> - replace the collection</li>
        <li><code>GET/POST /api/private-mode</code> - read or toggle private mode</li>
    </ul>
</body>
</html>"#,
        title = app.page_title,
    ))
}
