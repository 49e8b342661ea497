//! Test doubles and common utilities for contract tests
//!
//! The doubles count their calls so tests can assert which network steps
//! ran without touching the network.

#![allow(dead_code)]

use dnsup_core::error::{Error, Result};
use dnsup_core::{
    Credentials, IpResolver, MemorySink, RecordUpdater, Scheduler, UpdateOperation,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;

/// The record used throughout the contract tests
pub fn credentials() -> Credentials {
    Credentials::new("42", "a@b.com", "k1")
}

/// An IpResolver that returns a fixed answer
pub struct MockResolver {
    answer: std::result::Result<String, String>,
    calls: AtomicUsize,
}

impl MockResolver {
    /// Resolver that always reports `ip`
    pub fn returning(ip: &str) -> Self {
        Self {
            answer: Ok(ip.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Resolver that always fails with `cause`
    pub fn failing(cause: &str) -> Self {
        Self {
            answer: Err(cause.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Get the number of times resolve() was called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpResolver for MockResolver {
    async fn resolve(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone().map_err(Error::network)
    }

    fn endpoint(&self) -> &str {
        "mock://myip"
    }
}

/// A RecordUpdater that records its calls
///
/// A gated updater blocks inside `update` until the test releases it with
/// [`MockUpdater::release`], which lets tests hold an update in flight.
pub struct MockUpdater {
    failure: Option<String>,
    gate: Option<Semaphore>,
    calls: AtomicUsize,
    received: std::sync::Mutex<Vec<(Credentials, String)>>,
}

impl MockUpdater {
    /// Updater that answers `good <ip>`
    pub fn echoing() -> Self {
        Self {
            failure: None,
            gate: None,
            calls: AtomicUsize::new(0),
            received: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Updater that always fails with `cause`
    pub fn failing(cause: &str) -> Self {
        Self {
            failure: Some(cause.to_string()),
            ..Self::echoing()
        }
    }

    /// Echoing updater that waits for [`MockUpdater::release`] on every call
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::echoing()
        }
    }

    /// Let `n` blocked or future calls through the gate
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Get the number of times update() was called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Credentials and IP of every call, oldest first
    pub fn received(&self) -> Vec<(Credentials, String)> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RecordUpdater for MockUpdater {
    async fn update(&self, credentials: &Credentials, ip: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received
            .lock()
            .unwrap()
            .push((credentials.clone(), ip.to_string()));

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate is never closed").forget();
        }

        match &self.failure {
            Some(cause) => Err(Error::network(cause.clone())),
            None => Ok(format!("good {}", ip)),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Doubles wired into an operation and a scheduler
pub struct Harness {
    pub resolver: Arc<MockResolver>,
    pub updater: Arc<MockUpdater>,
    pub sink: Arc<MemorySink>,
    pub scheduler: Scheduler,
}

impl Harness {
    pub fn new(resolver: MockResolver, updater: MockUpdater) -> Self {
        let resolver = Arc::new(resolver);
        let updater = Arc::new(updater);
        let sink = Arc::new(MemorySink::new());

        let scheduler = Scheduler::new(UpdateOperation::new(
            resolver.clone(),
            updater.clone(),
            sink.clone(),
        ));

        Self {
            resolver,
            updater,
            sink,
            scheduler,
        }
    }

    /// Harness whose resolver answers `203.0.113.5` and updater echoes
    pub fn healthy() -> Self {
        Self::new(MockResolver::returning("203.0.113.5"), MockUpdater::echoing())
    }

    /// A standalone operation sharing this harness's doubles
    pub fn operation(&self) -> UpdateOperation {
        UpdateOperation::new(
            self.resolver.clone(),
            self.updater.clone(),
            self.sink.clone(),
        )
    }

    /// Whether any log line contains `needle`
    pub fn logged(&self, needle: &str) -> bool {
        self.sink.messages().iter().any(|m| m.contains(needle))
    }
}

/// Yield to other tasks until `condition` holds
///
/// Yielding keeps the test task runnable, so a paused clock is never
/// auto-advanced while waiting.
pub async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
