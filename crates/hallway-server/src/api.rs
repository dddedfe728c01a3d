//! Public REST API: institutions, threads, votes, suggestions, and the
//! announcement banner.  Admin endpoints live in [`crate::admin`].
//!
//! Every response uses the board's JSON envelope: `{"success": true, ...}`
//! with a `data` or `message` field, or `{"success": false, "message"}` on
//! failure (see [`crate::error::ApiError`]).

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use hallway_shared::{ClassLevel, InstitutionKind, InstitutionStatus, SessionKey, VoteKind};
use hallway_store::{Database, Institution};

use crate::admin;
use crate::config::ServerConfig;
use crate::error::ApiError;

/// State shared by all handlers.
///
/// The store is synchronous; the mutex serializes every read-modify-write
/// against it, making each engine call a critical section on top of the
/// SQLite transaction it already runs in.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub sessions: Arc<SessionKey>,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let public = Router::new()
        .route("/ping", get(ping))
        .route("/ping/health", get(health))
        .route(
            "/schools",
            get(list_institutions).post(create_institution_request),
        )
        .route("/schools/announcement", get(active_announcement))
        .route("/schools/suggestions", post(create_suggestion))
        .route("/schools/{id}", get(get_institution))
        .route("/schools/{id}/classes", get(get_classes))
        .route("/schools/{id}/rumors", get(list_threads).post(post_thread))
        .route("/schools/rumors/{id}/vote", post(cast_vote))
        .route(
            "/schools/rumors/{id}/vote/{fingerprint}",
            get(get_user_vote),
        );

    Router::new()
        .nest("/api", public)
        .nest("/api/admin", admin::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Envelope helpers
// ---------------------------------------------------------------------------

pub(crate) fn ok_data(data: impl Serialize) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

pub(crate) fn ok_message(message: &str) -> Json<Value> {
    Json(json!({ "success": true, "message": message }))
}

pub(crate) fn ok_message_data(message: &str, data: impl Serialize) -> Json<Value> {
    Json(json!({ "success": true, "message": message, "data": data }))
}

// ---------------------------------------------------------------------------
// Liveness
// ---------------------------------------------------------------------------

async fn ping() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Server is awake",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

// ---------------------------------------------------------------------------
// Institutions
// ---------------------------------------------------------------------------

/// An approved institution plus how many threads it carries.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InstitutionWithCount {
    #[serde(flatten)]
    institution: Institution,
    rumor_count: i64,
}

#[derive(Deserialize)]
struct ListInstitutionsQuery {
    /// `school` or `college`; anything else is ignored.
    #[serde(rename = "type")]
    kind: Option<String>,
}

async fn list_institutions(
    State(state): State<AppState>,
    Query(query): Query<ListInstitutionsQuery>,
) -> Result<Json<Value>, ApiError> {
    let kind = query
        .kind
        .as_deref()
        .and_then(|k| k.parse::<InstitutionKind>().ok());

    let db = state.db.lock().await;
    let institutions = db.list_approved_with_thread_counts(kind)?;

    let data: Vec<InstitutionWithCount> = institutions
        .into_iter()
        .map(|(institution, rumor_count)| InstitutionWithCount {
            institution,
            rumor_count,
        })
        .collect();

    Ok(ok_data(data))
}

#[derive(Deserialize)]
struct CreateInstitutionRequest {
    name: String,
    city: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

pub(crate) fn parse_kind(kind: Option<&str>) -> Result<InstitutionKind, ApiError> {
    match kind {
        None => Ok(InstitutionKind::School),
        Some(k) => k.parse().map_err(|_| {
            ApiError::InvalidInput("Type must be either school or college".to_string())
        }),
    }
}

async fn create_institution_request(
    State(state): State<AppState>,
    Json(req): Json<CreateInstitutionRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let kind = parse_kind(req.kind.as_deref())?;

    let mut db = state.db.lock().await;
    let institution =
        db.create_institution(&req.name, &req.city, kind, InstitutionStatus::Pending)?;

    info!(id = %institution.id, %kind, "institution requested");
    Ok((
        StatusCode::CREATED,
        ok_message_data("Request submitted for approval", institution),
    ))
}

async fn get_institution(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let db = state.db.lock().await;
    let institution = db.get_approved_institution(id)?;
    Ok(ok_data(institution))
}

async fn get_classes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let db = state.db.lock().await;
    let institution = db.get_approved_institution(id)?;
    Ok(ok_data(institution.classes))
}

// ---------------------------------------------------------------------------
// Threads
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ListThreadsQuery {
    /// `7`..`12`, or `all`/absent for every class.
    class: Option<String>,
}

pub(crate) fn parse_class(class: Option<&str>) -> Result<Option<ClassLevel>, ApiError> {
    match class {
        None => Ok(None),
        Some("all") => Ok(None),
        Some(c) => c
            .parse()
            .map(Some)
            .map_err(|_| ApiError::InvalidInput("Invalid class selection".to_string())),
    }
}

async fn list_threads(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListThreadsQuery>,
) -> Result<Json<Value>, ApiError> {
    let class = parse_class(query.class.as_deref())?;

    let db = state.db.lock().await;
    let threads = db.list_threads(id, class)?;
    Ok(ok_data(threads))
}

#[derive(Deserialize)]
struct PostThreadRequest {
    content: String,
    class: Option<String>,
}

async fn post_thread(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PostThreadRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let class = parse_class(req.class.as_deref())?;

    let mut db = state.db.lock().await;
    let thread = db.create_thread(id, &req.content, class)?;

    Ok((
        StatusCode::CREATED,
        ok_message_data("Thread posted successfully", thread),
    ))
}

// ---------------------------------------------------------------------------
// Votes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoteRequest {
    vote_type: String,
    user_fingerprint: String,
}

async fn cast_vote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<Value>, ApiError> {
    let kind: VoteKind = req
        .vote_type
        .parse()
        .map_err(|_| ApiError::InvalidInput("Invalid vote type".to_string()))?;

    let mut db = state.db.lock().await;
    let tally = db.cast_vote(id, &req.user_fingerprint, kind)?;

    let message = match tally.user_vote {
        None => "Vote removed",
        Some(k) if k == kind => "Vote recorded",
        Some(_) => "Vote updated",
    };
    Ok(ok_message_data(message, tally))
}

async fn get_user_vote(
    State(state): State<AppState>,
    Path((id, fingerprint)): Path<(Uuid, String)>,
) -> Result<Json<Value>, ApiError> {
    let db = state.db.lock().await;
    let user_vote = db.get_user_vote(id, &fingerprint)?;
    Ok(ok_data(json!({ "userVote": user_vote })))
}

// ---------------------------------------------------------------------------
// Suggestions & announcement
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SuggestionRequest {
    content: String,
}

async fn create_suggestion(
    State(state): State<AppState>,
    Json(req): Json<SuggestionRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut db = state.db.lock().await;
    let suggestion = db.create_suggestion(&req.content)?;
    Ok((
        StatusCode::CREATED,
        ok_message_data("Suggestion submitted successfully", suggestion),
    ))
}

async fn active_announcement(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let mut db = state.db.lock().await;
    let announcement = db.active_announcement()?;
    Ok(ok_data(announcement))
}

// ---------------------------------------------------------------------------
// Serving
// ---------------------------------------------------------------------------

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
