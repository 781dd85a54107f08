use std::time::Duration;

use anyhow::{ensure, Result};

/// Per-attempt bound on a single replication request.
pub const DEFAULT_REPLICATION_TIMEOUT: Duration = Duration::from_secs(2);

/// Startup configuration for one node. Immutable once the node is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Node identity, stamped as `origin` on local writes and used as the LWW tie-break.
    pub id: String,
    /// Host or IP the HTTP listener binds to.
    pub host: String,
    /// Port the HTTP listener binds to. Use 0 for an ephemeral port.
    pub port: u16,
    /// Base URLs of peer nodes, in the order they were given.
    pub peers: Vec<String>,
    pub replication_timeout: Duration,
}

impl NodeConfig {
    /// Builds a validated config, normalizing the raw peer entries.
    pub fn new(
        id: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        peers: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Result<Self> {
        let id = id.into();
        ensure!(!id.is_empty(), "node id must not be empty");
        ensure!(
            id.trim() == id,
            "node id {id:?} must not have leading or trailing whitespace"
        );

        let host = host.into();
        ensure!(!host.trim().is_empty(), "bind host must not be empty");

        Ok(Self {
            id,
            host,
            port,
            peers: normalize_peers(peers),
            replication_timeout: DEFAULT_REPLICATION_TIMEOUT,
        })
    }

    /// Replaces the per-attempt replication bound. A zero bound is rejected.
    pub fn with_replication_timeout(mut self, timeout: Duration) -> Result<Self> {
        ensure!(!timeout.is_zero(), "replication timeout must be greater than zero");
        self.replication_timeout = timeout;
        Ok(self)
    }

    /// `host:port` string handed to the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Trims entries, drops empty ones and trailing slashes, and defaults the scheme to http.
pub fn normalize_peers(raw: impl IntoIterator<Item = impl AsRef<str>>) -> Vec<String> {
    raw.into_iter()
        .filter_map(|entry| {
            let trimmed = entry.as_ref().trim().trim_end_matches('/');
            if trimmed.is_empty() {
                return None;
            }
            if trimmed.contains("://") {
                Some(trimmed.to_string())
            } else {
                Some(format!("http://{trimmed}"))
            }
        })
        .collect()
}
