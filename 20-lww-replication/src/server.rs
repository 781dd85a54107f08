use std::{future::Future, net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api;
use crate::config::NodeConfig;
use crate::node::Node;

/// A bound listener plus the node it serves.
pub struct NodeServer {
    listener: TcpListener,
    node: Arc<Node>,
}

impl NodeServer {
    pub fn new(listener: TcpListener, node: Arc<Node>) -> Self {
        Self { listener, node }
    }

    /// Builds the node described by `config` and binds its listener.
    pub async fn bind(config: &NodeConfig) -> Result<Self> {
        let node = Node::new(config)?;
        let listener = TcpListener::bind(config.bind_addr())
            .await
            .with_context(|| format!("failed to bind {}", config.bind_addr()))?;
        Ok(Self::new(listener, Arc::new(node)))
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn node(&self) -> Arc<Node> {
        Arc::clone(&self.node)
    }

    /// Serves requests until `shutdown` resolves.
    ///
    /// Replication tasks still in flight at shutdown are abandoned.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let NodeServer { listener, node } = self;
        let id = node.id().to_string();

        axum::serve(listener, api::router(node))
            .with_graceful_shutdown(shutdown)
            .await
            .context("http server failed")?;

        info!(node = %id, "node shut down");
        Ok(())
    }

    pub async fn run_until_ctrl_c(self) -> Result<()> {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = ?err, "failed to install ctrl-c handler");
            }
        })
        .await
    }
}
