//! Model Context Protocol server.
//!
//! [`protocol`] holds the JSON-RPC 2.0 wire types, [`server`] routes methods
//! to the tool, resource and prompt catalogs, and [`stdio`] is the default
//! line-delimited transport. The HTTP transport lives in
//! [`gateway`](crate::gateway).

pub mod protocol;
pub mod server;
pub mod stdio;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION};
pub use server::{McpServer, SERVER_NAME};
pub use stdio::{run_stdio, serve_lines};
