//! HTTP API server.
//!
//! Exposes the query pipeline and memory lifecycle over a JSON HTTP API:
//! `/api/query`, `/api/history`, `/api/search`, `/api/memories`,
//! `/api/stats`, and `/health`. Every handler shares one [`TwinEngine`].

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::config::TwinConfig;
use crate::engine::{StoreRequest, TwinEngine};
use crate::memory::types::ChatRole;

/// Reply returned when the pipeline itself errors out.
const ERROR_REPLY: &str =
    "I'm having trouble processing your request right now. Could you try rephrasing your question?";

const DEFAULT_HISTORY_LIMIT: usize = 50;
const DEFAULT_MEMORY_LIMIT: usize = 50;

/// Start the HTTP server and block until ctrl-c.
pub async fn serve(config: TwinConfig) -> Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let bind_addr = format!("{host}:{port}");

    let engine = Arc::new(TwinEngine::from_config(config)?);
    tracing::info!(addr = %bind_addr, "starting twinvault server");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("twinvault listening at http://{bind_addr}");

    axum::serve(listener, router(engine))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for ctrl-c");
            tracing::info!("shutting down server");
        })
        .await?;

    Ok(())
}

pub fn router(engine: Arc<TwinEngine>) -> Router {
    Router::new()
        .route("/api/query", post(handle_query))
        .route("/api/history/{user_id}", get(handle_history))
        .route("/api/search/{user_id}", get(handle_search))
        .route("/api/memories", post(handle_store_memory))
        .route("/api/memories/{user_id}", get(handle_list_memories))
        .route("/api/memories/{id}", delete(handle_delete_memory))
        .route("/api/stats/{user_id}", get(handle_stats))
        .route("/health", get(handle_health))
        .with_state(engine)
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

// ── POST /api/query ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct QueryRequest {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    message: String,
}

async fn handle_query(
    State(engine): State<Arc<TwinEngine>>,
    Json(request): Json<QueryRequest>,
) -> Response {
    if request.user_id.trim().is_empty() || request.message.trim().is_empty() {
        return bad_request("user_id and message are required");
    }

    // The user's turn is part of the record even if the pipeline fails.
    if let Err(err) = engine.record_turn(&request.user_id, ChatRole::User, &request.message) {
        error!(error = %err, "failed to persist user turn");
    }

    match engine.answer_query(&request.user_id, &request.message).await {
        Ok(outcome) => {
            if let Err(err) = engine.record_turn(&request.user_id, ChatRole::Assistant, &outcome.reply)
            {
                error!(error = %err, "failed to persist assistant turn");
            }
            Json(json!({
                "reply": outcome.reply,
                "intent": outcome.intent,
                "memories_found": outcome.memories_found,
                "context_length": outcome.context_length,
            }))
            .into_response()
        }
        Err(err) => {
            error!(error = %err, user = %request.user_id, "query pipeline failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "reply": ERROR_REPLY })),
            )
                .into_response()
        }
    }
}

// ── GET /api/history/{user_id} ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PageParams {
    limit: Option<usize>,
    offset: Option<usize>,
}

async fn handle_history(
    State(engine): State<Arc<TwinEngine>>,
    Path(user_id): Path<String>,
    Query(page): Query<PageParams>,
) -> Response {
    let limit = page.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let offset = page.offset.unwrap_or(0);

    match engine.history(&user_id, limit, offset) {
        Ok((messages, total)) => {
            let has_more = (offset + messages.len()) < total as usize;
            Json(json!({
                "messages": messages,
                "total_count": total,
                "has_more": has_more,
            }))
            .into_response()
        }
        Err(err) => {
            error!(error = %err, user = %user_id, "history lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed to load history" })),
            )
                .into_response()
        }
    }
}

// ── GET /api/search/{user_id}?q= ──────────────────────────────────────────

async fn handle_search(
    State(engine): State<Arc<TwinEngine>>,
    Path(user_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(query) = params.get("q").filter(|q| !q.trim().is_empty()) else {
        return bad_request("query parameter q is required");
    };

    match engine.retrieve(&user_id, query).await {
        Ok(candidates) => Json(json!({
            "query": query,
            "count": candidates.len(),
            "results": candidates,
        }))
        .into_response(),
        Err(err) => {
            error!(error = %err, user = %user_id, "search failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "search failed" })),
            )
                .into_response()
        }
    }
}

// ── Memory lifecycle ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct StoreMemoryRequest {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    tags: Vec<String>,
    emotion: Option<String>,
    file_name: Option<String>,
    #[serde(default)]
    encrypt: bool,
}

async fn handle_store_memory(
    State(engine): State<Arc<TwinEngine>>,
    Json(request): Json<StoreMemoryRequest>,
) -> Response {
    if request.user_id.trim().is_empty() || request.content.trim().is_empty() {
        return bad_request("user_id and content are required");
    }

    let store = StoreRequest {
        user_id: request.user_id,
        content: request.content,
        tags: request.tags,
        emotion: request.emotion,
        file_name: request.file_name,
        encrypt: request.encrypt,
    };

    match engine.store_memory(store).await {
        Ok(memory) => (StatusCode::CREATED, Json(memory)).into_response(),
        Err(err) => {
            error!(error = %err, "memory store failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed to store memory" })),
            )
                .into_response()
        }
    }
}

async fn handle_list_memories(
    State(engine): State<Arc<TwinEngine>>,
    Path(user_id): Path<String>,
    Query(page): Query<PageParams>,
) -> Response {
    let limit = page.limit.unwrap_or(DEFAULT_MEMORY_LIMIT);
    match engine.list_memories(&user_id, limit) {
        Ok(memories) => Json(json!({ "memories": memories })).into_response(),
        Err(err) => {
            error!(error = %err, user = %user_id, "memory list failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed to list memories" })),
            )
                .into_response()
        }
    }
}

async fn handle_delete_memory(
    State(engine): State<Arc<TwinEngine>>,
    Path(id): Path<String>,
) -> Response {
    match engine.delete_memory(&id) {
        Ok(Some(memory)) => Json(json!({ "deleted": memory })).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "memory not found" })),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, memory = %id, "memory delete failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed to delete memory" })),
            )
                .into_response()
        }
    }
}

// ── GET /api/stats/{user_id} ──────────────────────────────────────────────

async fn handle_stats(
    State(engine): State<Arc<TwinEngine>>,
    Path(user_id): Path<String>,
) -> Response {
    match engine.memory_stats(&user_id) {
        Ok(stats) => Json(stats).into_response(),
        Err(err) => {
            error!(error = %err, user = %user_id, "stats failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed to compute stats" })),
            )
                .into_response()
        }
    }
}

// ── GET /health ───────────────────────────────────────────────────────────

async fn handle_health() -> Response {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") })).into_response()
}
