//! cache_get tool implementation.
//!
//! Looks a URL up across every namespace, the way a cache fallback does.

use offgrid_client::resolve;
use offgrid_core::{CacheDb, Error, Request};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL or origin-relative path of the stored GET request.
    pub url: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    /// Stored body decoded as UTF-8 (lossy).
    pub body: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(cache: &CacheDb, origin: &Url, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = resolve(origin, &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let request = Request::get(url);

    let response = cache
        .match_any(&request)
        .await?
        .ok_or_else(|| Error::CacheMiss(request.cache_url()))?;

    let output = CacheGetOutput {
        body: String::from_utf8_lossy(&response.body).into_owned(),
        url: response.url,
        status: response.status,
        status_text: response.status_text,
        headers: response.headers,
    };
    json_result(&output)
}
