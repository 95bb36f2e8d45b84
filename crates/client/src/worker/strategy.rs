//! Per-class fetch strategies.
//!
//! | class        | strategy                                              |
//! |--------------|-------------------------------------------------------|
//! | document     | network first, refresh runtime cache, offline page    |
//! | static asset | cache first, refresh static cache on miss             |
//! | api          | network only                                          |
//! | default      | network first, cache 200s only, stale fallback        |
//!
//! Each strategy makes at most one network attempt. Whenever a response is
//! both returned and stored, the copy is taken right after it arrives and
//! the store runs in the background.

use serde::Serialize;

use super::{Network, RequestClass, ServiceWorker, classify};
use crate::fetch::resolve;
use offgrid_core::{Error, Request, Response};

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Network,
    Cache,
    /// The pre-warmed offline page stood in for a document.
    OfflineFallback,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Network => "network",
            Source::Cache => "cache",
            Source::OfflineFallback => "offline_fallback",
        }
    }
}

/// A response the worker answered a request with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub class: RequestClass,
    pub source: Source,
    pub response: Response,
}

/// What the worker did with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted: the caller performs its default network request.
    Passthrough,
    /// Intercepted and answered.
    Respond(Served),
}

impl FetchOutcome {
    pub fn served(&self) -> Option<&Served> {
        match self {
            FetchOutcome::Passthrough => None,
            FetchOutcome::Respond(served) => Some(served),
        }
    }
}

impl<N: Network> ServiceWorker<N> {
    /// Handle an intercepted request.
    ///
    /// # Errors
    ///
    /// - `Error::Network` when a static-asset or API fetch fails
    /// - `Error::NoResponse` when a document or default request fails and
    ///   no cached copy (or offline page) exists
    /// - `Error::FetchTooLarge` and other non-network fetch errors, which
    ///   never fall back to the cache
    /// - cache errors from lookups on the fallback paths
    pub async fn on_fetch(&self, request: Request) -> Result<FetchOutcome, Error> {
        let class = classify(&request, &self.manifest);
        tracing::debug!(method = %request.method, url = %request.url, class = %class, "fetch");

        let served = match class {
            RequestClass::Unhandled => return Ok(FetchOutcome::Passthrough),
            RequestClass::Document => self.network_first_document(request).await?,
            RequestClass::StaticAsset => self.cache_first(request).await?,
            RequestClass::Api => self.network_only(request).await?,
            RequestClass::Default => self.network_first_default(request).await?,
        };

        Ok(FetchOutcome::Respond(served))
    }

    async fn network_first_document(&self, request: Request) -> Result<Served, Error> {
        let class = RequestClass::Document;
        match self.network.fetch(&request).await {
            Ok(response) => {
                let copy = response.clone();
                self.store_in_background(&self.manifest.runtime_cache, request, copy);
                Ok(Served { class, source: Source::Network, response })
            }
            Err(err @ Error::Network(_)) => {
                tracing::debug!(url = %request.url, error = %err, "document fetch failed, trying cache");
                if let Some(response) = self.db.match_any(&request).await? {
                    return Ok(Served { class, source: Source::Cache, response });
                }

                let offline = resolve(&self.origin, &self.manifest.offline_page)
                    .map(Request::get)
                    .map_err(|e| Error::InvalidUrl(e.to_string()))?;
                let namespace = self.db.namespace(&self.manifest.static_cache);
                match namespace.match_request(&offline).await? {
                    Some(response) => Ok(Served { class, source: Source::OfflineFallback, response }),
                    None => Err(Error::NoResponse(format!("{}: {} (no offline page cached)", request.url, err))),
                }
            }
            Err(err) => Err(err),
        }
    }

    async fn cache_first(&self, request: Request) -> Result<Served, Error> {
        let class = RequestClass::StaticAsset;
        if let Some(response) = self.db.match_any(&request).await? {
            return Ok(Served { class, source: Source::Cache, response });
        }

        let response = self.network.fetch(&request).await?;
        let copy = response.clone();
        self.store_in_background(&self.manifest.static_cache, request, copy);
        Ok(Served { class, source: Source::Network, response })
    }

    async fn network_only(&self, request: Request) -> Result<Served, Error> {
        let response = self.network.fetch(&request).await?;
        Ok(Served { class: RequestClass::Api, source: Source::Network, response })
    }

    async fn network_first_default(&self, request: Request) -> Result<Served, Error> {
        let class = RequestClass::Default;
        match self.network.fetch(&request).await {
            Ok(response) => {
                if response.status == 200 {
                    let copy = response.clone();
                    self.store_in_background(&self.manifest.runtime_cache, request, copy);
                }
                Ok(Served { class, source: Source::Network, response })
            }
            Err(err @ Error::Network(_)) => match self.db.match_any(&request).await? {
                Some(response) => Ok(Served { class, source: Source::Cache, response }),
                None => Err(Error::NoResponse(format!("{}: {}", request.url, err))),
            },
            Err(err) => Err(err),
        }
    }
}
