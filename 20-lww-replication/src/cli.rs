use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use crate::config::NodeConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run one node of a last-writer-wins replicated key-value store", long_about = None)]
pub struct Cli {
    /// Node identity. Stamped on every local write and used to break timestamp ties.
    #[arg(long)]
    pub id: String,

    /// Host or IP to bind the HTTP listener to.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the HTTP listener to. Use 0 for an ephemeral port.
    #[arg(long)]
    pub port: u16,

    /// Comma-separated peer base URLs, e.g. http://127.0.0.1:8002,http://127.0.0.1:8003
    #[arg(long, value_delimiter = ',')]
    pub peers: Vec<String>,

    /// Upper bound on each replication request, in milliseconds.
    #[arg(long, default_value_t = 2000)]
    pub replication_timeout_ms: u64,
}

impl Cli {
    pub fn into_config(self) -> Result<NodeConfig> {
        NodeConfig::new(self.id, self.host, self.port, self.peers)?
            .with_replication_timeout(Duration::from_millis(self.replication_timeout_ms))
    }
}
