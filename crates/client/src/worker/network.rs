//! The network seam the worker fetches through.

use async_trait::async_trait;
use offgrid_core::{Error, Request, Response};

/// Something that can carry a request to the origin.
///
/// `fetch` resolves with any response the server produced, whatever its
/// status, and fails only when no response arrived at all.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

#[async_trait]
impl<N: Network + ?Sized> Network for std::sync::Arc<N> {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        (**self).fetch(request).await
    }
}
