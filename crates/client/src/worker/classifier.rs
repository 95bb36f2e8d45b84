//! Request classification.
//!
//! Rules are checked in order and the first match wins:
//! 1. non-GET -> unhandled
//! 2. `Accept` mentions `text/html` -> document
//! 3. build prefix or static extension -> static asset
//! 4. API prefix -> api
//! 5. anything else -> default

use serde::Serialize;

use super::Manifest;
use offgrid_core::Request;

/// How the worker handles an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestClass {
    /// Not intercepted; the request goes to the network untouched.
    Unhandled,
    /// Network first, refresh runtime cache, offline page fallback.
    Document,
    /// Cache first, refresh static cache on miss.
    StaticAsset,
    /// Network only.
    Api,
    /// Network first, cache only 200s, stale fallback.
    Default,
}

impl RequestClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestClass::Unhandled => "unhandled",
            RequestClass::Document => "document",
            RequestClass::StaticAsset => "static_asset",
            RequestClass::Api => "api",
            RequestClass::Default => "default",
        }
    }
}

impl std::fmt::Display for RequestClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a request against the manifest's path rules.
pub fn classify(request: &Request, manifest: &Manifest) -> RequestClass {
    if !request.is_get() {
        return RequestClass::Unhandled;
    }

    if request.header("accept").is_some_and(|accept| accept.contains("text/html")) {
        return RequestClass::Document;
    }

    let path = request.url.path();
    if path.starts_with(&manifest.build_prefix) || has_static_extension(path, &manifest.static_extensions) {
        return RequestClass::StaticAsset;
    }

    if path.starts_with(&manifest.api_prefix) {
        return RequestClass::Api;
    }

    RequestClass::Default
}

fn has_static_extension(path: &str, extensions: &[String]) -> bool {
    match path.rsplit_once('.') {
        Some((_, ext)) => extensions.iter().any(|known| known == ext),
        None => false,
    }
}
