//! Route handlers.
//!
//! Query strings and bodies are turned into attribute bags and handed to
//! [`PostGrid`](postgrid_query::PostGrid), which owns all normalization.

use std::collections::BTreeMap;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::Extension;
use postgrid_core::ContentEvent;
use postgrid_query::{CategoryEntry, ContentRecord, ContentTypeInfo};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::middleware::RequestContext;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct FlushResponse {
    pub flushed: bool,
}

fn query_attributes(params: BTreeMap<String, String>) -> Value {
    Value::Object(params.into_iter().map(|(name, value)| (name, Value::String(value))).collect())
}

/// `GET /posts`
pub async fn list_posts(
    State(state): State<AppState>, Extension(ctx): Extension<RequestContext>, Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<Vec<ContentRecord>>, ApiError> {
    let attrs = query_attributes(params);
    let records = state.grid.fetch_posts(&attrs, &ctx.viewer, &ctx.client).await?;
    Ok(Json(records))
}

/// `POST /render`. Always 200; an unreadable body renders with defaults.
pub async fn render(State(state): State<AppState>, Extension(ctx): Extension<RequestContext>, body: Bytes) -> Html<String> {
    let attrs = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "render body is not JSON; using defaults");
            Value::Null
        })
    };
    Html(state.grid.render(&attrs, &ctx.viewer).await)
}

/// `GET /categories`
pub async fn list_categories(
    State(state): State<AppState>, Query(params): Query<BTreeMap<String, String>>,
) -> Json<Vec<CategoryEntry>> {
    Json(state.grid.categories(&query_attributes(params)).await)
}

/// `GET /post-types`
pub async fn list_post_types(
    State(state): State<AppState>, Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<ContentTypeInfo>>, ApiError> {
    Ok(Json(state.grid.content_types(&ctx.viewer).await?))
}

/// `POST /cache/flush`
pub async fn flush_cache(
    State(state): State<AppState>, Extension(ctx): Extension<RequestContext>,
) -> Result<Json<FlushResponse>, ApiError> {
    let flushed = state.grid.flush(&ctx.viewer).await?;
    Ok(Json(FlushResponse { flushed }))
}

/// `POST /events`
pub async fn content_event(
    State(state): State<AppState>, Extension(ctx): Extension<RequestContext>, body: Bytes,
) -> Result<Json<FlushResponse>, ApiError> {
    if !ctx.viewer.is_privileged() {
        return Err(ApiError::forbidden("reporting content events requires edit capability"));
    }

    let event: ContentEvent =
        serde_json::from_slice(&body).map_err(|e| ApiError::invalid_input(format!("invalid content event: {e}")))?;
    let flushed = state.grid.handle_event(&event).await;
    Ok(Json(FlushResponse { flushed }))
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}
