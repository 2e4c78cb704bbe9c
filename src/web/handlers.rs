use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
    Json,
};
use serde_json::{json, Value};
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::domain::notice::{ListQuery, NewNotice, NoticePatch};
use crate::error::{AppError, Result};
use crate::services::stats::StatsSnapshot;
use crate::services::storage::NoticePage;
use crate::state::AppState;
use crate::web::client::ClientKey;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let now = state.clock.now().format(&Rfc3339).unwrap_or_default();
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "active_notices": state.store.len().await,
        "timestamp": now,
    }))
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.store.stats_snapshot().await)
}

pub async fn list_notices(
    State(state): State<AppState>,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<NoticePage>> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    Ok(Json(state.store.list(&query).await))
}

pub async fn create_notice(
    State(state): State<AppState>,
    client: ClientKey,
    body: std::result::Result<Json<NewNotice>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    check_rate(&state, &client).await?;
    let Json(input) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let notice = state.store.insert(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "message": "Notice added successfully", "notice": notice })),
    ))
}

pub async fn create_batch(
    State(state): State<AppState>,
    client: ClientKey,
    body: std::result::Result<Json<Vec<NewNotice>>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    check_rate(&state, &client).await?;
    let Json(inputs) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    if inputs.is_empty() {
        return Err(AppError::Validation("batch must contain at least one notice".into()));
    }
    let outcome = state.store.insert_batch(inputs).await;
    let status = if outcome.created.is_empty() { StatusCode::BAD_REQUEST } else { StatusCode::CREATED };
    Ok((
        status,
        Json(json!({
            "success": outcome.errors.is_empty(),
            "created": outcome.created,
            "errors": outcome.errors,
        })),
    ))
}

pub async fn update_notice(
    State(state): State<AppState>,
    client: ClientKey,
    Path(id): Path<String>,
    body: std::result::Result<Json<NoticePatch>, JsonRejection>,
) -> Result<Json<Value>> {
    check_rate(&state, &client).await?;
    let id = parse_id(&id)?;
    let Json(patch) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let notice = state.store.update(id, patch).await?;
    Ok(Json(json!({ "status": "success", "message": "Notice updated successfully", "notice": notice })))
}

pub async fn delete_notice(
    State(state): State<AppState>,
    client: ClientKey,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    check_rate(&state, &client).await?;
    let notice = state.store.delete(parse_id(&id)?).await?;
    Ok(Json(json!({ "status": "success", "message": "Notice deleted successfully", "notice": notice })))
}

/// Counts every request that reaches the router.
pub async fn count_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    state.stats.record_request();
    next.run(req).await
}

async fn check_rate(state: &AppState, client: &ClientKey) -> Result<()> {
    if state.limiter.lock().await.allow(&client.0) {
        Ok(())
    } else {
        Err(AppError::RateLimited)
    }
}

fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("notice {raw} not found")))
}
