//! Client code for offgrid.
//!
//! This crate provides the HTTP fetch pipeline and the offline-first worker
//! that mediates between a page, the network and the durable cache.

pub mod fetch;
pub mod worker;

pub use fetch::{FetchClient, FetchConfig, UrlError, resolve};

pub use worker::{
    ActivateOutcome, FetchOutcome, InstallOutcome, Manifest, Network, RequestClass, Served, ServiceWorker, Source,
    WorkerState, classify,
};
