//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles that record how the engine
//! drives them without performing any real network I/O.

#![allow(dead_code)]

use ddns_core::config::{DdnsConfig, Environment, Families, ProviderConfig, Schedule};
use ddns_core::error::{Error, Result};
use ddns_core::traits::{AddressFamily, AddressSource, DnsProvider};
use ddns_core::{AddressResolver, DdnsEngine, ProviderRegistry};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Backoff used by test resolvers (matches the production default timeout)
pub const TEST_BACKOFF: Duration = Duration::from_secs(2);

/// An address source that replays scripted results
///
/// Scripted results are consumed in order, regardless of family. Once the
/// script is exhausted every lookup answers with the family's current
/// address, which tests can change between cycles.
#[derive(Clone)]
pub struct ScriptedAddressSource {
    script: Arc<Mutex<VecDeque<Result<String>>>>,
    ipv4: Arc<Mutex<String>>,
    ipv6: Arc<Mutex<String>>,
    calls: Arc<Mutex<Vec<(AddressFamily, Instant)>>>,
}

impl ScriptedAddressSource {
    pub fn new(ipv4: &str, ipv6: &str) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            ipv4: Arc::new(Mutex::new(ipv4.to_string())),
            ipv6: Arc::new(Mutex::new(ipv6.to_string())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a result for an upcoming lookup
    pub fn push(&self, result: Result<String>) {
        self.script.lock().unwrap().push_back(result);
    }

    /// Change the address answered once the script is exhausted
    pub fn set_address(&self, family: AddressFamily, address: &str) {
        let slot = match family {
            AddressFamily::V4 => &self.ipv4,
            AddressFamily::V6 => &self.ipv6,
        };
        *slot.lock().unwrap() = address.to_string();
    }

    /// Every lookup attempt made so far
    pub fn calls(&self) -> Vec<(AddressFamily, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of lookup attempts made so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl AddressSource for ScriptedAddressSource {
    async fn fetch(&self, family: AddressFamily) -> Result<String> {
        self.calls.lock().unwrap().push((family, Instant::now()));

        if let Some(result) = self.script.lock().unwrap().pop_front() {
            return result;
        }

        let address = match family {
            AddressFamily::V4 => self.ipv4.lock().unwrap().clone(),
            AddressFamily::V6 => self.ipv6.lock().unwrap().clone(),
        };
        Ok(format!("{address}\n"))
    }

    fn endpoint(&self, family: AddressFamily) -> &str {
        match family {
            AddressFamily::V4 => "scripted://ipv4",
            AddressFamily::V6 => "scripted://ipv6",
        }
    }
}

/// A mock DnsProvider that records updates and can be told to fail
#[derive(Clone)]
pub struct MockDnsProvider {
    /// Recorded (family, address) pairs, in call order
    updates: Arc<Mutex<Vec<(AddressFamily, String)>>>,
    /// Number of upcoming calls that should fail
    failures_left: Arc<AtomicUsize>,
    /// Number of providers created from this mock by the registry
    created: Arc<AtomicUsize>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self {
            updates: Arc::new(Mutex::new(Vec::new())),
            failures_left: Arc::new(AtomicUsize::new(0)),
            created: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make the next `count` update calls fail
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Every update call made so far, failed ones included
    pub fn updates(&self) -> Vec<(AddressFamily, String)> {
        self.updates.lock().unwrap().clone()
    }

    /// Number of update calls made so far
    pub fn update_call_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    /// Number of provider instances created through the registry
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Register this mock under `name`, sharing its counters with every instance
    pub fn register(&self, registry: &ProviderRegistry, name: &str) {
        let shared = self.clone();
        registry.register_provider(
            name,
            Box::new(move |_config: &ProviderConfig| -> Result<Box<dyn DnsProvider>> {
                shared.created.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(shared.clone()))
            }),
        );
    }

    fn record(&self, family: AddressFamily, address: &str) -> Result<()> {
        self.updates
            .lock()
            .unwrap()
            .push((family, address.to_string()));

        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        if should_fail {
            Err(Error::Other("Provider unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn update_record(&self, ipv4: &str) -> Result<()> {
        self.record(AddressFamily::V4, ipv4)
    }

    async fn update_record6(&self, ipv6: &str) -> Result<()> {
        self.record(AddressFamily::V6, ipv6)
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a minimal DdnsConfig for testing
pub fn minimal_config(schedule: Schedule, ipv4: bool, ipv6: bool) -> DdnsConfig {
    let mut config = DdnsConfig::default();
    config.schedule = schedule;
    config.families = Families { ipv4, ipv6 };
    config.resolver.timeout = TEST_BACKOFF;
    config
}

/// Build an engine wired to the given doubles, with the mock registered as "mock"
pub fn engine_with(
    source: &ScriptedAddressSource,
    provider: &MockDnsProvider,
    config: DdnsConfig,
) -> DdnsEngine {
    let registry = Arc::new(ProviderRegistry::new());
    provider.register(&registry, "mock");

    let resolver = AddressResolver::new(Box::new(source.clone()), config.resolver.timeout);
    let provider_config = ProviderConfig::from_environment(Environment::from_vars([(
        "PROVIDER", "mock",
    )]))
    .expect("PROVIDER is set");

    DdnsEngine::new(resolver, registry, provider_config, config)
        .expect("engine construction succeeds")
}
