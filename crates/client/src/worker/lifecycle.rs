//! Install and activate handling.

use futures_util::future::try_join_all;
use serde::Serialize;

use super::{Network, ServiceWorker};
use crate::fetch::resolve;
use offgrid_core::{Error, Request, Response};

/// Lifecycle states of a worker version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Created, no lifecycle event handled yet
    Parsed,
    /// Install in progress
    Installing,
    /// Pre-warm finished; waiting to activate
    Installed,
    /// Activation (namespace cleanup) in progress
    Activating,
    /// Active and controlling pages
    Activated,
    /// Install failed; this version never takes over
    Redundant,
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(s)
    }
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallOutcome {
    /// Namespace the shell resources were stored in.
    pub namespace: String,
    /// URLs that were fetched and stored.
    pub precached: Vec<String>,
    /// The new version activates without waiting for open pages to close.
    pub skip_waiting: bool,
}

/// Result of an activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivateOutcome {
    /// Stale namespaces that were deleted.
    pub deleted: Vec<String>,
    /// Namespaces left in place.
    pub kept: Vec<String>,
    /// Open pages are controlled immediately, without a reload.
    pub clients_claimed: bool,
}

impl<N: Network> ServiceWorker<N> {
    /// Pre-warm the static namespace with the manifest's shell resources.
    ///
    /// Every resource is fetched before anything is stored, and all of them
    /// are stored in one transaction. A rejected fetch or a non-2xx status
    /// fails the install, stores nothing and marks this version redundant.
    pub async fn on_install(&self) -> Result<InstallOutcome, Error> {
        self.set_state(WorkerState::Installing).await;

        match self.precache().await {
            Ok(precached) => {
                self.set_state(WorkerState::Installed).await;
                tracing::info!(
                    namespace = %self.manifest.static_cache,
                    count = precached.len(),
                    "install complete"
                );
                Ok(InstallOutcome { namespace: self.manifest.static_cache.clone(), precached, skip_waiting: true })
            }
            Err(e) => {
                self.set_state(WorkerState::Redundant).await;
                tracing::warn!(error = %e, "install failed");
                Err(e)
            }
        }
    }

    async fn precache(&self) -> Result<Vec<String>, Error> {
        let requests = self
            .manifest
            .precache
            .iter()
            .map(|path| {
                resolve(&self.origin, path)
                    .map(Request::get)
                    .map_err(|e| Error::InstallFailed { url: path.clone(), reason: e.to_string() })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let responses = try_join_all(requests.iter().map(|request| self.fetch_for_install(request))).await?;

        let pairs: Vec<(Request, Response)> = requests.into_iter().zip(responses).collect();
        let namespace = self.db.open_namespace(&self.manifest.static_cache).await?;
        namespace.put_all(&pairs).await?;

        Ok(pairs.into_iter().map(|(request, _)| request.cache_url()).collect())
    }

    async fn fetch_for_install(&self, request: &Request) -> Result<Response, Error> {
        let response = self
            .network
            .fetch(request)
            .await
            .map_err(|e| Error::InstallFailed { url: request.url.to_string(), reason: e.to_string() })?;

        if !response.is_ok() {
            return Err(Error::InstallFailed {
                url: request.url.to_string(),
                reason: format!("status {}", response.status),
            });
        }

        Ok(response)
    }

    /// Delete every namespace that isn't the current static or runtime one,
    /// then claim open pages.
    pub async fn on_activate(&self) -> Result<ActivateOutcome, Error> {
        self.set_state(WorkerState::Activating).await;

        let mut deleted = Vec::new();
        let mut kept = Vec::new();
        for name in self.db.namespace_names().await? {
            if self.manifest.is_current(&name) {
                kept.push(name);
            } else {
                self.db.delete_namespace(&name).await?;
                tracing::info!(namespace = %name, "deleted stale cache namespace");
                deleted.push(name);
            }
        }

        self.set_state(WorkerState::Activated).await;
        Ok(ActivateOutcome { deleted, kept, clients_claimed: true })
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{MockNetwork, origin, test_worker};
    use super::*;
    use crate::worker::Manifest;
    use offgrid_core::CacheDb;

    #[tokio::test]
    async fn test_install_precaches_shell() {
        let network = MockNetwork::new();
        network.respond("/", 200, "<html>home</html>");
        network.respond("/offline.html", 200, "<html>offline</html>");
        let worker = test_worker(network).await;

        let outcome = worker.on_install().await.unwrap();

        assert!(outcome.skip_waiting);
        assert_eq!(outcome.namespace, worker.manifest().static_cache);
        assert_eq!(
            outcome.precached,
            vec!["https://random-generator.example/", "https://random-generator.example/offline.html"]
        );
        assert_eq!(worker.state().await, WorkerState::Installed);

        let ns = worker.cache().namespace(&worker.manifest().static_cache);
        let offline = ns
            .match_request(&Request::get(origin().join("/offline.html").unwrap()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&offline.body[..], b"<html>offline</html>");
    }

    #[tokio::test]
    async fn test_install_is_idempotent() {
        let network = MockNetwork::new();
        network.respond("/", 200, "home");
        network.respond("/offline.html", 200, "offline");
        let worker = test_worker(network).await;

        worker.on_install().await.unwrap();
        worker.on_install().await.unwrap();

        let keys = worker
            .cache()
            .namespace(&worker.manifest().static_cache)
            .keys()
            .await
            .unwrap();
        let urls: Vec<&str> = keys.iter().map(|k| k.url.as_str()).collect();
        assert_eq!(urls, vec!["https://random-generator.example/", "https://random-generator.example/offline.html"]);
    }

    #[tokio::test]
    async fn test_install_fails_on_network_error_and_stores_nothing() {
        let network = MockNetwork::new();
        network.respond("/", 200, "home");
        network.fail("/offline.html");
        let worker = test_worker(network).await;

        let result = worker.on_install().await;

        assert!(matches!(result, Err(Error::InstallFailed { ref url, .. }) if url.ends_with("/offline.html")));
        assert_eq!(worker.state().await, WorkerState::Redundant);
        assert!(!worker.cache().has_namespace(&worker.manifest().static_cache).await.unwrap());
    }

    #[tokio::test]
    async fn test_install_fails_on_error_status() {
        let network = MockNetwork::new();
        network.respond("/", 500, "boom");
        network.respond("/offline.html", 200, "offline");
        let worker = test_worker(network).await;

        let result = worker.on_install().await;
        assert!(matches!(result, Err(Error::InstallFailed { ref reason, .. }) if reason == "status 500"));
    }

    #[tokio::test]
    async fn test_failed_reinstall_keeps_previous_shell() {
        let network = MockNetwork::new();
        network.respond("/", 200, "home v1");
        network.respond("/offline.html", 200, "offline v1");
        let worker = test_worker(network).await;
        worker.on_install().await.unwrap();

        worker.network().fail("/");
        assert!(worker.on_install().await.is_err());

        let ns = worker.cache().namespace(&worker.manifest().static_cache);
        let home = ns.match_request(&Request::get(origin())).await.unwrap().unwrap();
        assert_eq!(&home.body[..], b"home v1");
    }

    #[tokio::test]
    async fn test_activate_purges_stale_namespaces() {
        let manifest = Manifest {
            static_cache: "v-current-static".into(),
            runtime_cache: "runtime-cache".into(),
            ..Default::default()
        };
        let db = CacheDb::open_in_memory().await.unwrap();
        for name in ["v-old", "v-current-static", "runtime-cache"] {
            db.open_namespace(name).await.unwrap();
        }
        let worker = ServiceWorker::new(db, MockNetwork::new(), manifest, origin());

        let outcome = worker.on_activate().await.unwrap();

        assert_eq!(outcome.deleted, vec!["v-old".to_string()]);
        assert_eq!(outcome.kept, vec!["v-current-static".to_string(), "runtime-cache".to_string()]);
        assert!(outcome.clients_claimed);
        assert_eq!(
            worker.cache().namespace_names().await.unwrap(),
            vec!["v-current-static".to_string(), "runtime-cache".to_string()]
        );
        assert_eq!(worker.state().await, WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_activate_with_no_namespaces() {
        let worker = test_worker(MockNetwork::new()).await;
        let outcome = worker.on_activate().await.unwrap();
        assert!(outcome.deleted.is_empty());
        assert!(outcome.kept.is_empty());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(WorkerState::Redundant.to_string(), "redundant");
    }
}
