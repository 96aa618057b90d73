//! HTTP handlers: learner-facing pages/forms and the content JSON API
//!
//! Page routes return JSON view data and use redirects the way the site's
//! forms expect: unknown ids go home, progress/quiz posts bounce back to the
//! module anchor. API routes under /api/content surface content problems as
//! 404s and log the underlying cause for operators.

use axum::{
    extract::{Extension, Form, Path, Query, State},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::content::{filter, ContentError, ContentModule};
use crate::quiz;
use crate::server::auth::{
    Identity, LoginError, LoginRequest, LoginResponse, LogoutRequest, RefreshRequest, TokenType,
};
use crate::server::ServerState;
use crate::session::SessionContext;

/// View data for the home page
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeView {
    pub modules: Vec<ContentModule>,
    pub session: SessionContext,
    pub is_authenticated: bool,
    pub username: String,
    pub scores: HashMap<String, u32>,
    pub completed: Vec<String>,
    pub pinned: Vec<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// View data for a single module page
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleView {
    pub module: ContentModule,
    pub session: SessionContext,
    pub is_authenticated: bool,
    pub username: String,
    pub scores: HashMap<String, u32>,
    pub completed: Vec<String>,
    pub pinned: Vec<String>,
}

/// Preference form fields
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesForm {
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub target_os: String,
    #[serde(default)]
    pub focus: Option<String>,
}

/// Complete/pin form fields
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressForm {
    pub module_id: String,
    pub section_id: String,
}

/// Status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub modules: usize,
    pub auth_enabled: bool,
}

/// Optional level/OS filters on the document endpoints
#[derive(Debug, Deserialize)]
pub struct DocumentQuery {
    pub level: Option<String>,
    #[serde(rename = "targetOS")]
    pub target_os: Option<String>,
}

/// Home page: modules filtered by the caller's session context
pub async fn home_handler(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    headers: HeaderMap,
) -> Response {
    let ctx = state.sessions.context(session_id(&headers));
    let modules = match filter::filter_modules(&state.catalog, &ctx) {
        Ok(modules) => modules,
        Err(e) => return filter_failure(e),
    };

    let username = identity.username().unwrap_or("").to_string();
    let progress = state.progress.snapshot(&username);
    let view = HomeView {
        modules,
        is_authenticated: identity.is_authenticated(),
        scores: if identity.is_authenticated() { progress.scores } else { HashMap::new() },
        completed: sorted(if identity.is_authenticated() { progress.completed } else { Default::default() }),
        pinned: sorted(if identity.is_authenticated() { progress.pinned } else { Default::default() }),
        last_updated: if identity.is_authenticated() { progress.last_updated } else { None },
        username,
        session: ctx,
    };
    (StatusCode::OK, Json(view)).into_response()
}

/// Single module page; unknown ids redirect home
pub async fn module_handler(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    headers: HeaderMap,
    Path(module_id): Path<String>,
) -> Response {
    let ctx = state.sessions.context(session_id(&headers));
    let module = match filter::module_by_id(&state.catalog, &module_id, &ctx) {
        Ok(Some(module)) => module,
        Ok(None) => return Redirect::to("/").into_response(),
        Err(e) => return filter_failure(e),
    };

    let username = identity.username().unwrap_or("").to_string();
    let progress = state.progress.snapshot(&username);
    let view = ModuleView {
        module,
        is_authenticated: identity.is_authenticated(),
        scores: if identity.is_authenticated() { progress.scores } else { HashMap::new() },
        completed: sorted(if identity.is_authenticated() { progress.completed } else { Default::default() }),
        pinned: sorted(if identity.is_authenticated() { progress.pinned } else { Default::default() }),
        username,
        session: ctx,
    };
    (StatusCode::OK, Json(view)).into_response()
}

/// Update session preferences. Unrecognized level/OS values reject the whole
/// update with a 400 and leave the stored context unchanged.
pub async fn preferences_handler(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Form(form): Form<PreferencesForm>,
) -> Response {
    let sid = session_id(&headers).unwrap_or_else(Uuid::new_v4);
    let mut ctx = state.sessions.context(Some(sid));

    if let Err(e) = ctx.apply_preferences(&form.level, &form.target_os, form.focus.as_deref()) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response();
    }

    state.sessions.put(sid, ctx);
    let cookie = format!("sid={}; Path=/; HttpOnly; SameSite=Lax", sid);
    ([(SET_COOKIE, cookie)], Redirect::to("/")).into_response()
}

/// Mark a section completed for the authenticated user
pub async fn complete_handler(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Form(form): Form<ProgressForm>,
) -> Response {
    if let Some(username) = identity.username() {
        state.progress.mark_completed(username, &form.section_id);
    }
    Redirect::to(&format!("/modules/{}#{}", form.module_id, form.section_id)).into_response()
}

/// Toggle a section's pinned state for the authenticated user
pub async fn pin_handler(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Form(form): Form<ProgressForm>,
) -> Response {
    if let Some(username) = identity.username() {
        state.progress.toggle_pinned(username, &form.section_id);
    }
    Redirect::to(&format!("/modules/{}#{}", form.module_id, form.section_id)).into_response()
}

/// Grade a quiz submission. The section is looked up unfiltered so grading
/// works regardless of the current filter context. Anonymous submissions get
/// their score in the redirect but nothing is recorded.
pub async fn quiz_submit_handler(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let (Some(module_id), Some(section_id)) = (form.get("moduleId"), form.get("sectionId"))
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "moduleId and sectionId are required" })),
        )
            .into_response();
    };

    let Some(section) = filter::section(&state.catalog, module_id, section_id) else {
        return Redirect::to(&format!("/modules/{}", module_id)).into_response();
    };
    if !section.has_questions() {
        return Redirect::to(&format!("/modules/{}", module_id)).into_response();
    }

    let score = match quiz::grade(section, &form) {
        Ok(score) => score,
        Err(e) => {
            warn!("Rejected quiz submission for {}: {}", section_id, e);
            return Redirect::to(&format!("/modules/{}#{}", module_id, section_id))
                .into_response();
        }
    };

    if let Some(username) = identity.username() {
        state.progress.record_score(username, section_id, score);
        info!("Recorded score {} on {} for {}", score, section_id, username);
    }

    Redirect::to(&format!(
        "/modules/{}?score={}#{}",
        module_id, score, section_id
    ))
    .into_response()
}

/// GET /api/content/manifest
pub async fn manifest_handler(State(state): State<ServerState>) -> Response {
    match state.library.manifest() {
        Ok(manifest) => (StatusCode::OK, Json(manifest)).into_response(),
        Err(e) => content_failure(e),
    }
}

/// GET /api/content/documents?level=&targetOS=
pub async fn documents_handler(
    State(state): State<ServerState>,
    Query(query): Query<DocumentQuery>,
) -> Response {
    match state
        .library
        .all_documents(query.level.as_deref(), query.target_os.as_deref())
    {
        Ok(docs) => (StatusCode::OK, Json(docs)).into_response(),
        Err(e) => content_failure(e),
    }
}

/// GET /api/content/documents/by-module?level=&targetOS=
pub async fn documents_by_module_handler(
    State(state): State<ServerState>,
    Query(query): Query<DocumentQuery>,
) -> Response {
    match state
        .library
        .documents_by_module(query.level.as_deref(), query.target_os.as_deref())
    {
        Ok(grouped) => (StatusCode::OK, Json(grouped)).into_response(),
        Err(e) => content_failure(e),
    }
}

/// GET /api/content/documents/{id}
pub async fn document_by_id_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Response {
    match state.library.document_by_id(&id) {
        Ok(doc) => (StatusCode::OK, Json(doc)).into_response(),
        Err(e) => content_failure(e),
    }
}

/// JWT login handler
pub async fn login_handler(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> Response {
    let roles = match state.auth_state.authenticate(&req.username, &req.password) {
        Ok(roles) => roles,
        Err(e @ LoginError::Locked(_)) => {
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response();
        }
        Err(e @ LoginError::InvalidCredentials) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    issue_tokens(&state, &req.username, &roles)
}

/// JWT refresh handler
pub async fn refresh_handler(
    State(state): State<ServerState>,
    Json(req): Json<RefreshRequest>,
) -> Response {
    let claims = match state.auth_state.validate_token(&req.refresh_token) {
        Ok(claims) => claims,
        Err(e) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "Invalid refresh token",
                    "details": e.to_string()
                })),
            )
                .into_response();
        }
    };

    if claims.token_type != TokenType::Refresh {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid token type" })),
        )
            .into_response();
    }

    state.auth_state.revoke_token(&claims.jti);
    issue_tokens(&state, &claims.sub, &claims.roles)
}

/// JWT logout handler
pub async fn logout_handler(
    State(state): State<ServerState>,
    Json(req): Json<LogoutRequest>,
) -> Response {
    match state.auth_state.extract_jti(&req.token) {
        Ok(jti) => {
            state.auth_state.revoke_token(&jti);
            (
                StatusCode::OK,
                Json(json!({ "message": "Logged out successfully" })),
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Invalid token",
                "details": e.to_string()
            })),
        )
            .into_response(),
    }
}

/// Status handler
pub async fn status_handler(State(state): State<ServerState>) -> Response {
    let response = StatusResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        modules: state.catalog.modules.len(),
        auth_enabled: true,
    };
    (StatusCode::OK, Json(response)).into_response()
}

fn issue_tokens(state: &ServerState, username: &str, roles: &[String]) -> Response {
    let access_token = match state.auth_state.generate_access_token(username, roles) {
        Ok(token) => token,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to generate access token",
                    "details": e.to_string()
                })),
            )
                .into_response();
        }
    };

    let refresh_token = match state.auth_state.generate_refresh_token(username) {
        Ok(token) => token,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to generate refresh token",
                    "details": e.to_string()
                })),
            )
                .into_response();
        }
    };

    let response = LoginResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.auth_state.access_token_expiry_minutes() * 60,
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// Content failures surface as 404s; anything beyond a plain missing id gets
/// logged for operators.
fn content_failure(err: ContentError) -> Response {
    if err.is_not_found() {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response();
    }
    error!("Content loading failed: {}", err);
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "content not found" })),
    )
        .into_response()
}

/// Unparsable level strings are caught at catalog load; hitting one here
/// means the catalog was swapped underneath us.
fn filter_failure(err: crate::types::ParseLevelError) -> Response {
    error!("Content filtering failed: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "invalid content catalog" })),
    )
        .into_response()
}

/// The visitor's session id, read from the `sid` cookie
fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    let cookies = headers.get("cookie")?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        pair.trim()
            .strip_prefix("sid=")
            .and_then(|v| Uuid::parse_str(v).ok())
    })
}

fn sorted(set: std::collections::HashSet<String>) -> Vec<String> {
    let mut items: Vec<String> = set.into_iter().collect();
    items.sort();
    items
}
