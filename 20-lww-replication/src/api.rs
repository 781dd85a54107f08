//! HTTP surface of a node.
//!
//! | method | path         | handler                  |
//! |--------|--------------|--------------------------|
//! | GET    | `/get?key=K` | [`Node::get`]            |
//! | GET    | `/status`    | [`Node::status`]         |
//! | POST   | `/put`       | [`Node::put`]            |
//! | POST   | `/replicate` | [`Node::replicate_in`]   |
//!
//! Anything else, including the wrong method on a known path, answers
//! `404 {"ok": false, "error": "not found"}`.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::message::{
    GetParams, GetResponse, PutRequest, PutResponse, ReplicateRequest, ReplicateResponse,
    StatusResponse,
};
use crate::node::Node;

/// Builds the router for `node`.
pub fn router(node: Arc<Node>) -> Router {
    Router::new()
        .route("/get", get(get_key).fallback(not_found))
        .route("/status", get(status).fallback(not_found))
        .route("/put", post(put).fallback(not_found))
        .route("/replicate", post(replicate).fallback(not_found))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(node)
}

async fn get_key(
    State(node): State<Arc<Node>>,
    params: Option<Query<GetParams>>,
) -> Result<Json<GetResponse>, ApiError> {
    let key = params.map(|Query(p)| p.key).unwrap_or_default();
    let Some(entry) = node.get(&key) else {
        return Err(ApiError::KeyNotFound {
            lamport: node.lamport(),
        });
    };

    Ok(Json(GetResponse {
        ok: true,
        key,
        value: entry.value,
        ts: entry.ts,
        origin: entry.origin,
        lamport: node.lamport(),
    }))
}

async fn status(State(node): State<Arc<Node>>) -> Json<StatusResponse> {
    let status = node.status();
    Json(StatusResponse {
        ok: true,
        node: status.node,
        lamport: status.lamport,
        peers: status.peers,
        store: status.store,
    })
}

async fn put(State(node): State<Arc<Node>>, body: Bytes) -> Result<Json<PutResponse>, ApiError> {
    let PutRequest { key, value } = parse_body(&body)?;
    let outcome = node.put(key.clone(), value.clone())?;

    Ok(Json(PutResponse {
        ok: true,
        node: node.id().to_string(),
        key,
        value,
        ts: outcome.ts,
        lamport: outcome.lamport,
    }))
}

async fn replicate(
    State(node): State<Arc<Node>>,
    body: Bytes,
) -> Result<Json<ReplicateResponse>, ApiError> {
    let request: ReplicateRequest = parse_body(&body)?;
    let outcome = node.replicate_in(request)?;

    Ok(Json(ReplicateResponse {
        ok: true,
        node: node.id().to_string(),
        lamport: outcome.lamport,
        applied: outcome.applied,
    }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Decodes a POST body. An empty body counts as `{}`; anything that is not a
/// JSON object with the expected field types is rejected.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let raw: Value = if body.is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(body).map_err(|_| ApiError::InvalidJson)?
    };
    if !raw.is_object() {
        return Err(ApiError::InvalidJson);
    }
    serde_json::from_value(raw).map_err(|_| ApiError::InvalidJson)
}
