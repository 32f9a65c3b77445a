//! JSON-RPC API Layer
//!
//! Implements the JSON-RPC 2.0 server for hostctl: command execution,
//! process control, metrics and alerts.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use handler::{RpcHandler, RpcServices};
pub use server::{RpcServer, RpcServerConfig};
