//! One node of an eventually consistent, last-writer-wins key-value store.
//!
//! Clients write to any node. The node stamps each write with a Lamport
//! timestamp, applies it locally, and pushes it to every peer in the
//! background. Peers advance their own clocks past the received timestamp and
//! apply the same merge rule, so all nodes that have seen the same writes
//! hold the same value for every key.
//!
//! # Modules
//!
//! - [`clock`]: Lamport counter shared by all handlers
//! - [`store`]: key to entry map guarded by the `(ts, origin)` total order
//! - [`replication`]: per-peer, fire-and-forget delivery over HTTP
//! - [`node`]: the node service composing the three above
//! - [`api`]: axum routes for `/get`, `/status`, `/put`, `/replicate`
//! - [`server`]: listener ownership and graceful shutdown
//! - [`message`]: JSON request and response bodies
//! - [`config`] and [`cli`]: startup configuration
//! - [`error`]: node, HTTP and replication error types

pub mod api;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod message;
pub mod node;
pub mod replication;
pub mod server;
pub mod store;
