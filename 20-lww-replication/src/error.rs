//! Error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::clock::Timestamp;
use crate::message::ErrorResponse;

/// Client input rejected by the node service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    #[error("key required")]
    KeyRequired,

    /// Inbound replication missing its key or origin, or without a usable `ts`.
    #[error("key, origin, ts required")]
    InvalidReplication,
}

/// Errors surfaced at the HTTP boundary as `{ok: false, error}` bodies.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Node(#[from] NodeError),

    #[error("invalid json")]
    InvalidJson,

    #[error("key not found")]
    KeyNotFound {
        /// Clock reading at the time of the lookup.
        lamport: Timestamp,
    },

    #[error("not found")]
    NotFound,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Node(_) | Self::InvalidJson => StatusCode::BAD_REQUEST,
            Self::KeyNotFound { .. } | Self::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            Self::KeyNotFound { lamport } => {
                ErrorResponse::new(self.to_string()).with_lamport(lamport)
            }
            _ => ErrorResponse::new(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

/// A single failed delivery to a peer. Logged, never retried.
#[derive(Debug, thiserror::Error)]
pub enum ReplicationError {
    #[error("request to {peer} timed out")]
    Timeout { peer: String },

    #[error("request to {peer} failed: {source}")]
    Transport {
        peer: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{peer} answered {status}")]
    Rejected { peer: String, status: StatusCode },
}

impl ReplicationError {
    pub(crate) fn from_reqwest(peer: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                peer: peer.to_string(),
            }
        } else {
            Self::Transport {
                peer: peer.to_string(),
                source,
            }
        }
    }
}
