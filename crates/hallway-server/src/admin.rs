//! Admin REST API: login, moderation, and the approval queue.
//!
//! Every route except `/login` requires a bearer session token issued by
//! [`crate::auth::issue_session`].  When no admin password is configured the
//! whole surface answers 401.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use hallway_shared::InstitutionStatus;

use crate::api::{ok_data, ok_message, ok_message_data, parse_kind, AppState};
use crate::auth;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/schools", get(list_all_institutions).post(create_institution))
        .route("/schools/pending", get(list_pending_institutions))
        .route(
            "/schools/{id}",
            put(update_institution).delete(delete_institution),
        )
        .route("/schools/{id}/approve", put(approve_institution))
        .route("/schools/{id}/reject", delete(reject_institution))
        .route("/schools/{id}/threads", get(institution_threads))
        .route("/rumors/{id}", put(update_thread).delete(delete_thread))
        .route("/suggestions", get(list_suggestions))
        .route("/suggestions/{id}", delete(delete_suggestion))
        .route(
            "/announcement",
            get(get_announcement).put(update_announcement),
        )
        .route("/stats", get(stats))
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    auth::check_credentials(&state, &req.username, &req.password)?;
    let (token, expires_at) = auth::issue_session(&state);

    info!(username = %req.username, "admin login");
    Ok(ok_data(json!({
        "token": token,
        "expiresAt": expires_at.to_rfc3339(),
    })))
}

// ---------------------------------------------------------------------------
// Institutions
// ---------------------------------------------------------------------------

async fn list_all_institutions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    auth::require_admin(&headers, &state)?;

    let db = state.db.lock().await;
    let institutions = db.list_institutions(None)?;
    Ok(ok_data(institutions))
}

async fn list_pending_institutions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    auth::require_admin(&headers, &state)?;

    let db = state.db.lock().await;
    let institutions = db.list_institutions(Some(InstitutionStatus::Pending))?;
    Ok(ok_data(institutions))
}

#[derive(Deserialize)]
struct CreateInstitutionRequest {
    name: String,
    city: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Admin-created institutions skip the approval queue.
async fn create_institution(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateInstitutionRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    auth::require_admin(&headers, &state)?;
    let kind = parse_kind(req.kind.as_deref())?;

    let mut db = state.db.lock().await;
    let institution =
        db.create_institution(&req.name, &req.city, kind, InstitutionStatus::Approved)?;

    info!(id = %institution.id, "institution created by admin");
    Ok((
        StatusCode::CREATED,
        ok_message_data("Institution added successfully", institution),
    ))
}

#[derive(Deserialize)]
struct UpdateInstitutionRequest {
    name: String,
    city: String,
}

async fn update_institution(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateInstitutionRequest>,
) -> Result<Json<Value>, ApiError> {
    auth::require_admin(&headers, &state)?;

    let mut db = state.db.lock().await;
    let institution = db.update_institution(id, &req.name, &req.city)?;
    Ok(ok_message_data("Institution updated successfully", institution))
}

async fn approve_institution(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    auth::require_admin(&headers, &state)?;

    let mut db = state.db.lock().await;
    let institution = db.approve_institution(id)?;

    info!(id = %institution.id, "institution approved");
    Ok(ok_message_data("Institution approved", institution))
}

async fn reject_institution(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    auth::require_admin(&headers, &state)?;

    let mut db = state.db.lock().await;
    db.reject_institution(id)?;

    info!(%id, "institution rejected");
    Ok(ok_message("Request rejected and removed"))
}

/// Cascades: every thread and vote under the institution goes with it.
async fn delete_institution(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    auth::require_admin(&headers, &state)?;

    let mut db = state.db.lock().await;
    db.delete_institution(id)?;

    info!(%id, "institution deleted");
    Ok(ok_message("Institution and all its threads deleted"))
}

// ---------------------------------------------------------------------------
// Threads
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ThreadsQuery {
    class: Option<String>,
}

async fn institution_threads(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Query(query): Query<ThreadsQuery>,
) -> Result<Json<Value>, ApiError> {
    auth::require_admin(&headers, &state)?;
    let class = crate::api::parse_class(query.class.as_deref())?;

    let db = state.db.lock().await;
    // Admin sees threads for any institution, pending ones included.
    db.get_institution(id)?;
    let threads = db.list_threads(id, class)?;
    Ok(ok_data(threads))
}

#[derive(Deserialize)]
struct UpdateThreadRequest {
    content: String,
}

async fn update_thread(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateThreadRequest>,
) -> Result<Json<Value>, ApiError> {
    auth::require_admin(&headers, &state)?;

    let mut db = state.db.lock().await;
    let thread = db.update_thread_content(id, &req.content)?;
    Ok(ok_message_data("Thread updated successfully", thread))
}

async fn delete_thread(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    auth::require_admin(&headers, &state)?;

    let mut db = state.db.lock().await;
    if !db.delete_thread(id)? {
        return Err(ApiError::NotFound("Thread not found".to_string()));
    }

    info!(%id, "thread deleted");
    Ok(ok_message("Thread deleted successfully"))
}

// ---------------------------------------------------------------------------
// Suggestions & announcement
// ---------------------------------------------------------------------------

async fn list_suggestions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    auth::require_admin(&headers, &state)?;

    let db = state.db.lock().await;
    let suggestions = db.list_suggestions()?;
    Ok(ok_data(suggestions))
}

async fn delete_suggestion(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    auth::require_admin(&headers, &state)?;

    let mut db = state.db.lock().await;
    if !db.delete_suggestion(id)? {
        return Err(ApiError::NotFound("Suggestion not found".to_string()));
    }
    Ok(ok_message("Suggestion deleted successfully"))
}

async fn get_announcement(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    auth::require_admin(&headers, &state)?;

    let mut db = state.db.lock().await;
    let announcement = db.get_announcement()?;
    Ok(ok_data(announcement))
}

#[derive(Deserialize)]
struct AnnouncementRequest {
    content: String,
}

async fn update_announcement(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AnnouncementRequest>,
) -> Result<Json<Value>, ApiError> {
    auth::require_admin(&headers, &state)?;

    let mut db = state.db.lock().await;
    let announcement = db.update_announcement(&req.content)?;

    let message = if announcement.is_active {
        "Announcement published"
    } else {
        "Announcement cleared"
    };
    Ok(ok_message_data(message, announcement))
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

async fn stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    auth::require_admin(&headers, &state)?;

    let db = state.db.lock().await;
    let stats = db.board_stats()?;
    Ok(ok_data(stats))
}
