//! Test doubles and common utilities for contract tests
//!
//! These doubles record how they were called so tests can assert on the
//! number of outbound calls a tick makes, without any network access.

#![allow(dead_code)]

use ddns_core::config::{RecordConfig, TargetConfig};
use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsLookup, DnsProvider, IpSource};
use ddns_core::{Address, PublicIpResolver, Reconciler, UpdatePayload};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const RECORD_NAME: &str = "home";
pub const HOSTNAME: &str = "home.example.com";

pub fn addr(s: &str) -> Address {
    s.parse().expect("valid test address")
}

/// An IpSource that answers from a script
///
/// Each call consumes the next answer; the last answer repeats.
/// `None` answers fail as unreachable.
pub struct MockIpSource {
    name: String,
    answers: Arc<Mutex<Vec<Option<Address>>>>,
    delay: Option<Duration>,
    fetch_call_count: Arc<AtomicUsize>,
}

impl MockIpSource {
    pub fn ok(name: &str, ip: &str) -> Self {
        Self::scripted(name, vec![Some(addr(ip))])
    }

    pub fn failing(name: &str) -> Self {
        Self::scripted(name, vec![None])
    }

    pub fn scripted(name: &str, answers: Vec<Option<Address>>) -> Self {
        assert!(!answers.is_empty(), "script needs at least one answer");
        Self {
            name: name.to_string(),
            answers: Arc::new(Mutex::new(answers)),
            delay: None,
            fetch_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sleep for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get the number of times fetch() was called
    pub fn fetch_call_count(&self) -> usize {
        self.fetch_call_count.load(Ordering::SeqCst)
    }

    /// Create a new MockIpSource that shares script and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            name: other.name.clone(),
            answers: Arc::clone(&other.answers),
            delay: other.delay,
            fetch_call_count: Arc::clone(&other.fetch_call_count),
        }
    }

    fn next_answer(&self) -> Option<Address> {
        let mut answers = self.answers.lock().unwrap();
        if answers.len() > 1 {
            answers.remove(0)
        } else {
            answers[0]
        }
    }
}

#[async_trait::async_trait]
impl IpSource for MockIpSource {
    async fn fetch(&self) -> Result<Address> {
        self.fetch_call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.next_answer()
            .ok_or_else(|| Error::source_unreachable(&self.name, "operation timed out"))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A DnsLookup returning whatever address is currently set
///
/// Tests can change the published address between ticks with [`MockDnsLookup::publish`].
pub struct MockDnsLookup {
    published: Arc<Mutex<Option<Address>>>,
    delay: Option<Duration>,
    lookup_call_count: Arc<AtomicUsize>,
}

impl MockDnsLookup {
    pub fn resolving_to(ip: &str) -> Self {
        Self {
            published: Arc::new(Mutex::new(Some(addr(ip)))),
            delay: None,
            lookup_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            published: Arc::new(Mutex::new(None)),
            delay: None,
            lookup_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Change the address returned by subsequent lookups
    pub fn publish(&self, ip: &str) {
        *self.published.lock().unwrap() = Some(addr(ip));
    }

    /// Get the number of times lookup() was called
    pub fn lookup_call_count(&self) -> usize {
        self.lookup_call_count.load(Ordering::SeqCst)
    }

    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            published: Arc::clone(&other.published),
            delay: other.delay,
            lookup_call_count: Arc::clone(&other.lookup_call_count),
        }
    }
}

#[async_trait::async_trait]
impl DnsLookup for MockDnsLookup {
    async fn lookup(&self, hostname: &str) -> Result<Address> {
        self.lookup_call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let published = *self.published.lock().unwrap();
        published.ok_or_else(|| Error::resolution_failed(hostname, "no such host"))
    }
}

/// How the mock provider answers
#[derive(Debug, Clone, Copy)]
pub enum ProviderBehavior {
    Accept,
    Reject(u16),
    Unreachable,
}

/// A mock DnsProvider that records every payload it receives
pub struct MockDnsProvider {
    behavior: ProviderBehavior,
    delay: Option<Duration>,
    /// Call counter for update_record()
    update_call_count: Arc<AtomicUsize>,
    /// Calls currently in progress
    in_flight: Arc<AtomicUsize>,
    /// Highest number of calls ever in progress at once
    max_in_flight: Arc<AtomicUsize>,
    /// Recorded payloads from update calls
    payloads: Arc<Mutex<Vec<UpdatePayload>>>,
}

impl MockDnsProvider {
    pub fn new(behavior: ProviderBehavior) -> Self {
        Self {
            behavior,
            delay: None,
            update_call_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            payloads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn accepting() -> Self {
        Self::new(ProviderBehavior::Accept)
    }

    /// Sleep for `delay` inside every update call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get the number of times update_record() was called
    pub fn update_call_count(&self) -> usize {
        self.update_call_count.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Get the payloads received, in call order
    pub fn payloads(&self) -> Vec<UpdatePayload> {
        self.payloads.lock().unwrap().clone()
    }

    /// Create a new MockDnsProvider that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            behavior: other.behavior,
            delay: other.delay,
            update_call_count: Arc::clone(&other.update_call_count),
            in_flight: Arc::clone(&other.in_flight),
            max_in_flight: Arc::clone(&other.max_in_flight),
            payloads: Arc::clone(&other.payloads),
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn update_record(&self, payload: &UpdatePayload) -> Result<()> {
        self.update_call_count.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.payloads.lock().unwrap().push(payload.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.behavior {
            ProviderBehavior::Accept => Ok(()),
            ProviderBehavior::Reject(status) => {
                Err(Error::provider_status("mock", status, "rejected"))
            }
            ProviderBehavior::Unreachable => {
                Err(Error::provider_transport("mock", "connection refused"))
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Build a reconciler for [`HOSTNAME`] with default record settings
pub fn reconciler(
    sources: Vec<Box<dyn IpSource>>,
    lookup: MockDnsLookup,
    provider: MockDnsProvider,
) -> Reconciler {
    let resolver = PublicIpResolver::new(sources).expect("at least one source");
    Reconciler::new(
        resolver,
        Box::new(lookup),
        Box::new(provider),
        TargetConfig::new(RECORD_NAME, HOSTNAME),
        RecordConfig::default(),
    )
}
