//! Fire-and-forget fan-out of accepted writes to peer nodes.
//!
//! Each accepted write becomes one detached Tokio task per peer. A task makes
//! exactly one POST to the peer's `/replicate` endpoint, bounded by the
//! client timeout, and logs the outcome. No handle is kept: the writer never
//! learns whether delivery succeeded, and a failed delivery is not retried.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::clock::Timestamp;
use crate::error::ReplicationError;
use crate::message::{ReplicateRequest, ReplicateResponse};

/// A write as it travels between nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicatedWrite {
    pub key: String,
    pub value: serde_json::Value,
    pub ts: Timestamp,
    pub origin: String,
}

impl From<ReplicatedWrite> for ReplicateRequest {
    fn from(write: ReplicatedWrite) -> Self {
        Self {
            key: write.key,
            value: write.value,
            ts: write.ts,
            origin: write.origin,
        }
    }
}

/// Pushes writes to a fixed list of peers.
#[derive(Debug, Clone)]
pub struct Replicator {
    node_id: String,
    peers: Vec<String>,
    client: reqwest::Client,
    /// Artificial latency injected before delivering to a given peer.
    delays: HashMap<String, Duration>,
}

impl Replicator {
    /// Creates a dispatcher whose every delivery attempt is bounded by `timeout`.
    pub fn new(node_id: impl Into<String>, peers: Vec<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build replication http client")?;
        Ok(Self {
            node_id: node_id.into(),
            peers,
            client,
            delays: HashMap::new(),
        })
    }

    /// Delays every delivery to `peer` by `delay`, to simulate a slow link.
    pub fn with_peer_delay(mut self, peer: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(peer.into(), delay);
        self
    }

    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    /// Spawns one independent delivery task per peer and returns immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn replicate(&self, write: ReplicatedWrite) {
        for peer in &self.peers {
            let client = self.client.clone();
            let node_id = self.node_id.clone();
            let delay = self.delays.get(peer).copied();
            let peer = peer.clone();
            let write = write.clone();
            tokio::spawn(async move {
                if let Some(delay) = delay {
                    debug!(node = %node_id, %peer, ?delay, "delaying replication");
                    tokio::time::sleep(delay).await;
                }
                match post_replicate(&client, &peer, write).await {
                    Ok(ack) => debug!(
                        node = %node_id,
                        %peer,
                        applied = ack.applied,
                        peer_lamport = ack.lamport,
                        "replicated"
                    ),
                    Err(err) => warn!(node = %node_id, %peer, error = %err, "replicate failed"),
                }
            });
        }
    }

    /// Makes a single delivery attempt to `peer` and returns its acknowledgement.
    pub async fn deliver(
        &self,
        peer: &str,
        write: ReplicatedWrite,
    ) -> Result<ReplicateResponse, ReplicationError> {
        post_replicate(&self.client, peer, write).await
    }
}

async fn post_replicate(
    client: &reqwest::Client,
    peer: &str,
    write: ReplicatedWrite,
) -> Result<ReplicateResponse, ReplicationError> {
    let url = format!("{}/replicate", peer.trim_end_matches('/'));
    let response = client
        .post(url)
        .json(&ReplicateRequest::from(write))
        .send()
        .await
        .map_err(|err| ReplicationError::from_reqwest(peer, err))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ReplicationError::Rejected {
            peer: peer.to_string(),
            status,
        });
    }

    response
        .json::<ReplicateResponse>()
        .await
        .map_err(|err| ReplicationError::from_reqwest(peer, err))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn write() -> ReplicatedWrite {
        ReplicatedWrite {
            key: "x".into(),
            value: json!("a"),
            ts: 1,
            origin: "A".into(),
        }
    }

    #[test]
    fn write_converts_to_wire_request() {
        let request = ReplicateRequest::from(write());
        assert_eq!(
            serde_json::to_value(request).unwrap(),
            json!({"key": "x", "value": "a", "ts": 1, "origin": "A"})
        );
    }

    #[tokio::test]
    async fn unreachable_peer_reports_error() {
        // Bind and drop to get a port with nothing listening on it.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let peer = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let replicator =
            Replicator::new("A", vec![peer.clone()], Duration::from_millis(500)).unwrap();
        let err = replicator.deliver(&peer, write()).await.unwrap_err();
        assert!(err.to_string().contains(&peer), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn silent_peer_times_out() {
        // Accepted by the kernel backlog but never read or answered.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let peer = format!("http://{}", listener.local_addr().unwrap());

        let timeout = Duration::from_millis(300);
        let replicator = Replicator::new("A", vec![peer.clone()], timeout).unwrap();
        let started = std::time::Instant::now();
        let err = replicator.deliver(&peer, write()).await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(
            matches!(&err, ReplicationError::Timeout { peer: p } if *p == peer),
            "unexpected error: {err}"
        );
        assert!(elapsed >= timeout, "gave up after {elapsed:?}");
        assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
        drop(listener);
    }

    #[tokio::test]
    async fn replicate_without_peers_is_a_no_op() {
        let replicator = Replicator::new("A", Vec::new(), Duration::from_secs(1)).unwrap();
        replicator.replicate(write());
        assert!(replicator.peers().is_empty());
    }
}
