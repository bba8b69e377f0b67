//! Test doubles and common utilities for poll loop contract tests
//!
//! Every double is cheaply cloneable and shares its recorded calls between
//! clones, so a test can hand one clone to the engine and inspect another.

#![allow(dead_code)]

use ddns_core::config::DdnsConfig;
use ddns_core::engine::EngineEvent;
use ddns_core::error::{Error, Result};
use ddns_core::traits::{DomainResolver, IpSource, UpdateDispatcher, UpdateResponse};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// An IpSource returning a fixed answer (or a fixed failure)
#[derive(Clone)]
pub struct FixedIpSource {
    answer: Arc<Mutex<Option<Ipv4Addr>>>,
    call_count: Arc<AtomicUsize>,
}

impl FixedIpSource {
    /// Always resolve to `ip`
    pub fn new(ip: Ipv4Addr) -> Self {
        Self {
            answer: Arc::new(Mutex::new(Some(ip))),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always fail as if the DNS reply had no answers
    pub fn failing() -> Self {
        Self {
            answer: Arc::new(Mutex::new(None)),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Change the answer for subsequent calls
    pub fn set(&self, ip: Option<Ipv4Addr>) {
        *self.answer.lock().unwrap() = ip;
    }

    /// Number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for FixedIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let answer = *self.answer.lock().unwrap();
        answer.ok_or(Error::EmptyAnswer)
    }

    fn source_name(&self) -> &'static str {
        "fixed"
    }
}

/// A DomainResolver with canned answers per domain
///
/// Unknown domains fail like an NXDOMAIN would.
#[derive(Clone, Default)]
pub struct StaticResolver {
    answers: Arc<Mutex<HashMap<String, Option<Vec<IpAddr>>>>>,
    lookups: Arc<Mutex<Vec<String>>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `ips` for `domain`
    pub fn with(self, domain: &str, ips: &[[u8; 4]]) -> Self {
        let ips = ips.iter().map(|octets| IpAddr::from(*octets)).collect();
        self.answers
            .lock()
            .unwrap()
            .insert(domain.to_string(), Some(ips));
        self
    }

    /// Make lookups of `domain` fail
    pub fn failing(self, domain: &str) -> Self {
        self.answers.lock().unwrap().insert(domain.to_string(), None);
        self
    }

    /// Domains looked up so far, in order
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DomainResolver for StaticResolver {
    async fn lookup(&self, domain: &str) -> Result<Vec<IpAddr>> {
        self.lookups.lock().unwrap().push(domain.to_string());

        match self.answers.lock().unwrap().get(domain) {
            Some(Some(ips)) => Ok(ips.clone()),
            _ => Err(Error::lookup(domain, "no such host")),
        }
    }
}

/// An UpdateDispatcher that records every request
#[derive(Clone, Default)]
pub struct RecordingDispatcher {
    requests: Arc<Mutex<Vec<(String, Ipv4Addr)>>>,
    failing_hosts: Arc<Mutex<Vec<String>>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests for `hostname` with a provider error
    pub fn failing_for(self, hostname: &str) -> Self {
        self.failing_hosts.lock().unwrap().push(hostname.to_string());
        self
    }

    /// Host names requested so far, in order
    pub fn hostnames(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(host, _)| host.clone())
            .collect()
    }

    /// Full request log
    pub fn requests(&self) -> Vec<(String, Ipv4Addr)> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests so far
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl UpdateDispatcher for RecordingDispatcher {
    async fn dispatch_update(&self, hostname: &str, ip: Ipv4Addr) -> Result<UpdateResponse> {
        self.requests
            .lock()
            .unwrap()
            .push((hostname.to_string(), ip));

        if self.failing_hosts.lock().unwrap().iter().any(|h| h == hostname) {
            return Err(Error::provider("recording", "503 Service Unavailable"));
        }

        Ok(UpdateResponse {
            status: 200,
            body: format!("good {}", ip),
        })
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// Helper to create a minimal DdnsConfig for testing
pub fn minimal_config(domains: &[&str]) -> DdnsConfig {
    DdnsConfig::new(
        domains.iter().map(|d| d.to_string()).collect(),
        "https://dyndns.test/nic/update?hostname=",
    )
    .with_credentials("user", "password")
    .with_frequency(Duration::from_secs(60))
    .with_debug(true)
}

/// Collect every event currently queued
pub fn drain_events(rx: &mut mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// In-memory log sink for a thread-local tracing subscriber
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain-text fmt subscriber writing every level into this sink
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        let sink = self.clone();
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish()
    }

    /// Everything logged so far
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Logged lines at WARN level
    pub fn warnings(&self) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.contains(" WARN "))
            .map(str::to_string)
            .collect()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
