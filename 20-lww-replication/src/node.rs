//! The node service: clock, store and dispatcher behind four operations.
//!
//! - [`Node::put`] accepts a client write, stamps it, applies it locally and
//!   hands it to the [`Replicator`].
//! - [`Node::get`] reads the local winner for a key.
//! - [`Node::replicate_in`] accepts a write forwarded by a peer.
//! - [`Node::status`] reports identity, clock, peers and a store snapshot.
//!
//! One `Node` is built per process and shared behind an `Arc` by every
//! request handler. Clock and store operations are synchronous and finish
//! before replication is spawned, so no lock is ever held across network I/O.

use std::collections::BTreeMap;

use anyhow::Result;
use serde_json::Value;
use tracing::info;

use crate::clock::{LamportClock, Timestamp};
use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::message::ReplicateRequest;
use crate::replication::{ReplicatedWrite, Replicator};
use crate::store::{Entry, LwwStore};

/// Result of a local write.
#[derive(Debug, Clone, PartialEq)]
pub struct PutOutcome {
    /// Timestamp assigned to the write.
    pub ts: Timestamp,
    /// Clock reading after the write.
    pub lamport: Timestamp,
    pub applied: bool,
}

/// Result of replication intake.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicateOutcome {
    pub applied: bool,
    pub lamport: Timestamp,
}

/// Point-in-time view of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeStatus {
    pub node: String,
    pub lamport: Timestamp,
    pub peers: Vec<String>,
    pub store: BTreeMap<String, Entry>,
}

pub struct Node {
    id: String,
    clock: LamportClock,
    store: LwwStore,
    replicator: Replicator,
}

impl Node {
    /// Builds a node with an empty store and a clock at zero.
    pub fn new(config: &NodeConfig) -> Result<Self> {
        let replicator = Replicator::new(
            config.id.clone(),
            config.peers.clone(),
            config.replication_timeout,
        )?;
        Ok(Self::with_replicator(config.id.clone(), replicator))
    }

    /// Builds a node around an already configured dispatcher.
    pub fn with_replicator(id: impl Into<String>, replicator: Replicator) -> Self {
        Self {
            id: id.into(),
            clock: LamportClock::new(),
            store: LwwStore::new(),
            replicator,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn peers(&self) -> &[String] {
        self.replicator.peers()
    }

    /// Current clock reading.
    pub fn lamport(&self) -> Timestamp {
        self.clock.read()
    }

    /// Accepts a client write.
    ///
    /// The write is committed locally before this returns; delivery to peers
    /// runs in the background and its outcome is never reported here.
    pub fn put(&self, key: String, value: Value) -> Result<PutOutcome, NodeError> {
        if key.is_empty() {
            return Err(NodeError::KeyRequired);
        }

        let ts = self.clock.tick_local();
        let applied = self.store.apply(&key, value.clone(), ts, &self.id);
        info!(node = %self.id, %key, ts, applied, "put");

        self.replicator.replicate(ReplicatedWrite {
            key,
            value,
            ts,
            origin: self.id.clone(),
        });

        Ok(PutOutcome {
            ts,
            lamport: self.clock.read(),
            applied,
        })
    }

    pub fn get(&self, key: &str) -> Option<Entry> {
        self.store.get(key)
    }

    /// Accepts a write forwarded by a peer.
    ///
    /// Advances the clock past `ts` and then offers the write to the store.
    /// Re-delivery of a write already held is reported as `applied: false`.
    pub fn replicate_in(&self, request: ReplicateRequest) -> Result<ReplicateOutcome, NodeError> {
        let ReplicateRequest {
            key,
            value,
            ts,
            origin,
        } = request;
        // A timestamp of MAX leaves no room to move the clock past it.
        if key.is_empty() || origin.is_empty() || ts == 0 || ts == Timestamp::MAX {
            return Err(NodeError::InvalidReplication);
        }

        let clock = self.clock.on_receive(ts);
        let applied = self.store.apply(&key, value, ts, &origin);
        info!(node = %self.id, %key, ts, %origin, lamport = clock, applied, "recv");

        Ok(ReplicateOutcome {
            applied,
            lamport: self.clock.read(),
        })
    }

    pub fn status(&self) -> NodeStatus {
        NodeStatus {
            node: self.id.clone(),
            lamport: self.clock.read(),
            peers: self.peers().to_vec(),
            store: self.store.snapshot(),
        }
    }
}
