//! cache_list tool implementation.
//!
//! Lists the worker's namespaces, or the entries stored in one of them.

use offgrid_core::{CacheDb, EntryMeta, Error};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {
    /// Namespace to list entries of. Omit to list namespaces.
    #[serde(default)]
    pub namespace: Option<String>,
}

/// A namespace and how many entries it holds.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NamespaceSummary {
    pub name: String,
    pub entries: usize,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CacheListOutput {
    Namespaces { namespaces: Vec<NamespaceSummary> },
    Entries { namespace: String, entries: Vec<EntryMeta> },
}

/// Implementation of the cache_list tool.
pub async fn list_impl(cache: &CacheDb, params: CacheListParams) -> Result<CallToolResult, McpError> {
    let output = match params.namespace {
        None => {
            let mut namespaces = Vec::new();
            for name in cache.namespace_names().await? {
                let entries = cache.namespace(&name).len().await?;
                namespaces.push(NamespaceSummary { name, entries });
            }
            CacheListOutput::Namespaces { namespaces }
        }
        Some(name) => {
            if !cache.has_namespace(&name).await? {
                return Err(Error::CacheMiss(format!("no namespace named {name}")).into());
            }
            let entries = cache.namespace(&name).keys().await?;
            CacheListOutput::Entries { namespace: name, entries }
        }
    };

    json_result(&output)
}
