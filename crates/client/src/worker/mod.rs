//! Offline-first fetch mediator.
//!
//! [`ServiceWorker`] has three entry points mirroring a browser service
//! worker's lifecycle:
//!
//! - [`ServiceWorker::on_install`] pre-warms the static namespace.
//! - [`ServiceWorker::on_activate`] purges namespaces from older releases.
//! - [`ServiceWorker::on_fetch`] classifies a request and runs its strategy.
//!
//! The cache store, the network and the cache policy are all injected.
//! Cache writes that accompany a response are spawned in the background and
//! never delay or fail the response; [`ServiceWorker::flush`] waits for them.

mod classifier;
mod lifecycle;
mod manifest;
mod network;
mod strategy;

#[cfg(test)]
mod testing;

pub use classifier::{RequestClass, classify};
pub use lifecycle::{ActivateOutcome, InstallOutcome, WorkerState};
pub use manifest::{
    API_PREFIX, BUILD_PREFIX, Manifest, OFFLINE_PAGE, PRECACHE, RUNTIME_CACHE, STATIC_CACHE, STATIC_EXTENSIONS,
};
pub use network::Network;
pub use strategy::{FetchOutcome, Served, Source};

use offgrid_core::{CacheDb, Request, Response};
use tokio::sync::{Mutex, RwLock};
use tokio_util::task::TaskTracker;
use url::Url;

/// The fetch mediator for one site origin.
pub struct ServiceWorker<N> {
    db: CacheDb,
    network: N,
    manifest: Manifest,
    origin: Url,
    state: RwLock<WorkerState>,
    writes: TaskTracker,
    /// Held across the close/wait/reopen sequence of `flush`.
    flushing: Mutex<()>,
}

impl<N: Network> ServiceWorker<N> {
    /// Create a worker for `origin`. Pre-warm paths resolve against it.
    pub fn new(db: CacheDb, network: N, manifest: Manifest, origin: Url) -> Self {
        Self {
            db,
            network,
            manifest,
            origin,
            state: RwLock::new(WorkerState::Parsed),
            writes: TaskTracker::new(),
            flushing: Mutex::new(()),
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn cache(&self) -> &CacheDb {
        &self.db
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    async fn set_state(&self, next: WorkerState) {
        let mut state = self.state.write().await;
        tracing::debug!(from = %*state, to = %next, "worker state transition");
        *state = next;
    }

    /// Wait for every background cache write spawned so far to finish.
    ///
    /// Concurrent callers are served one at a time.
    pub async fn flush(&self) {
        let _guard = self.flushing.lock().await;
        self.writes.close();
        self.writes.wait().await;
        self.writes.reopen();
    }

    /// Store a response copy without making the caller wait for it.
    ///
    /// A failed write is logged and dropped; the response the caller already
    /// holds is unaffected.
    fn store_in_background(&self, namespace: &str, request: Request, copy: Response) {
        let target = self.db.namespace(namespace);
        self.writes.spawn(async move {
            if let Err(e) = target.put(&request, &copy).await {
                tracing::warn!(
                    namespace = target.name(),
                    url = %request.url,
                    error = %e,
                    "background cache write failed"
                );
            }
        });
    }
}
