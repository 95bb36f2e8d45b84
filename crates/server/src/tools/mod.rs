//! MCP tool implementations.
//!
//! This module contains all tools exposed by the mcp-offgrid server.

pub mod cache;
pub mod worker;

pub use worker::{WorkerFetchParams, activate_impl, fetch_impl, install_impl};

use offgrid_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

/// Render a tool output as pretty JSON text content.
pub(crate) fn json_result(output: &impl Serialize) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
