//! worker_install, worker_activate and worker_fetch tool implementations.
//!
//! These drive the worker's lifecycle events and let a client issue a
//! request through the mediator to see which strategy answered it.

use offgrid_client::{FetchOutcome, Network, RequestClass, ServiceWorker, Source, classify, resolve};
use offgrid_core::{Error, Request, Response};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// Absolute URL or origin-relative path (e.g. "/build/app.js").
    pub url: String,

    /// HTTP method (default GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Accept header; include "text/html" to issue a page navigation.
    #[serde(default)]
    pub accept: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Output from the worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchOutput {
    /// False when the worker let the request pass straight to the network.
    pub intercepted: bool,
    pub class: String,
    pub source: String,
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    /// Response body decoded as UTF-8 (lossy).
    pub body: String,
}

impl WorkerFetchOutput {
    fn new(intercepted: bool, class: RequestClass, source: Source, response: Response) -> Self {
        Self {
            intercepted,
            class: class.as_str().to_string(),
            source: source.as_str().to_string(),
            body: String::from_utf8_lossy(&response.body).into_owned(),
            url: response.url,
            status: response.status,
            status_text: response.status_text,
            headers: response.headers,
        }
    }
}

/// Implementation of the worker_install tool.
pub async fn install_impl<N: Network>(worker: &ServiceWorker<N>) -> Result<CallToolResult, McpError> {
    let outcome = worker.on_install().await?;
    json_result(&outcome)
}

/// Implementation of the worker_activate tool.
pub async fn activate_impl<N: Network>(worker: &ServiceWorker<N>) -> Result<CallToolResult, McpError> {
    let outcome = worker.on_activate().await?;
    json_result(&outcome)
}

/// Implementation of the worker_fetch tool.
pub async fn fetch_impl<N: Network>(
    worker: &ServiceWorker<N>, params: WorkerFetchParams,
) -> Result<CallToolResult, McpError> {
    if params.method.trim().is_empty() {
        return Err(Error::InvalidInput("method must not be empty".to_string()).into());
    }

    let url = resolve(worker.origin(), &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let mut request = Request::new(&params.method, url);
    if let Some(accept) = params.accept.as_deref() {
        request = request.with_header("Accept", accept);
    }

    let output = match worker.on_fetch(request.clone()).await? {
        FetchOutcome::Passthrough => {
            let response = worker.network().fetch(&request).await?;
            let class = classify(&request, worker.manifest());
            WorkerFetchOutput::new(false, class, Source::Network, response)
        }
        FetchOutcome::Respond(served) => WorkerFetchOutput::new(true, served.class, served.source, served.response),
    };

    json_result(&output)
}
