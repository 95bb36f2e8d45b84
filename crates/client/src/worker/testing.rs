//! Test doubles for the worker.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use offgrid_core::{CacheDb, Error, Request, Response};
use url::Url;

use super::{Manifest, Network, ServiceWorker};

pub(crate) fn origin() -> Url {
    Url::parse("https://random-generator.example").unwrap()
}

pub(crate) fn url(path: &str) -> Url {
    origin().join(path).unwrap()
}

pub(crate) async fn test_worker(network: MockNetwork) -> ServiceWorker<MockNetwork> {
    let db = CacheDb::open_in_memory().await.unwrap();
    ServiceWorker::new(db, network, Manifest::default(), origin())
}

enum Reply {
    Respond(u16, Bytes),
    Fail,
    TooLarge,
}

/// Scripted network keyed by path and query. Records every call.
/// Unscripted paths answer 404.
#[derive(Default)]
pub(crate) struct MockNetwork {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl MockNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, target: &str, status: u16, body: &'static str) {
        self.replies
            .lock()
            .unwrap()
            .insert(target.to_string(), Reply::Respond(status, Bytes::from_static(body.as_bytes())));
    }

    pub(crate) fn fail(&self, target: &str) {
        self.replies.lock().unwrap().insert(target.to_string(), Reply::Fail);
    }

    /// Answer with a body over the byte limit: a response arrived but is refused.
    pub(crate) fn too_large(&self, target: &str) {
        self.replies.lock().unwrap().insert(target.to_string(), Reply::TooLarge);
    }

    /// Make every fetch fail, as if the device lost connectivity.
    pub(crate) fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn target_of(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let target = target_of(&request.url);
        self.calls.lock().unwrap().push(format!("{} {}", request.method, target));

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("{}: offline", request.url)));
        }

        match self.replies.lock().unwrap().get(&target) {
            Some(Reply::Respond(status, body)) => Ok(Response::new(request.url.as_str(), *status, body.clone())),
            Some(Reply::Fail) => Err(Error::Network(format!("{}: connection reset", request.url))),
            Some(Reply::TooLarge) => Err(Error::FetchTooLarge(format!("{}: 6291456 bytes", request.url))),
            None => Ok(Response::new(request.url.as_str(), 404, "not found")),
        }
    }
}
