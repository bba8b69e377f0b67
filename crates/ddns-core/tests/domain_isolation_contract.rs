//! Contract Test: Domain Isolation
//!
//! This test verifies that one domain's failures never leak into another.
//!
//! Constraints verified:
//! - A failed or empty lookup skips that domain only, without an update
//! - A failed update does not abort the remaining domains
//! - A failed update is not retried within the same cycle
//!
//! If this test fails, someone has:
//! - Forced updates on incomplete lookup information
//! - Propagated a per-domain error out of the cycle
//! - Added hidden retry loops around the dispatcher

mod common;

use common::*;
use ddns_core::DdnsEngine;
use ddns_core::engine::EngineEvent;
use ddns_core::error::Result;
use ddns_core::traits::DomainResolver;
use std::net::{IpAddr, Ipv4Addr};

#[tokio::test]
async fn failed_lookup_skips_only_that_domain() {
    let resolver = StaticResolver::new()
        .failing("broken.example.com")
        .with("ok.example.com", &[[1, 2, 3, 4]]);
    let dispatcher = RecordingDispatcher::new();

    let (engine, mut event_rx) = DdnsEngine::new(
        Box::new(FixedIpSource::new(Ipv4Addr::new(5, 6, 7, 8))),
        Box::new(resolver.clone()),
        Box::new(dispatcher.clone()),
        minimal_config(&["broken.example.com", "ok.example.com"]),
    )
    .expect("engine construction succeeds");

    let report = engine.run_cycle().await;

    assert_eq!(resolver.lookups().len(), 2, "both domains are looked up");
    assert_eq!(dispatcher.hostnames(), vec!["ok.example.com"]);
    assert_eq!(report.lookup_failed, vec!["broken.example.com"]);

    let events = drain_events(&mut event_rx);
    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::DomainLookupFailed { domain, .. } if domain == "broken.example.com"
    )));
}

#[tokio::test]
async fn empty_lookup_is_treated_like_a_failure() {
    struct EmptyResolver;

    #[async_trait::async_trait]
    impl DomainResolver for EmptyResolver {
        async fn lookup(&self, _domain: &str) -> Result<Vec<IpAddr>> {
            Ok(Vec::new())
        }
    }

    let dispatcher = RecordingDispatcher::new();

    let (engine, _event_rx) = DdnsEngine::new(
        Box::new(FixedIpSource::new(Ipv4Addr::new(5, 6, 7, 8))),
        Box::new(EmptyResolver),
        Box::new(dispatcher.clone()),
        minimal_config(&["example.com"]),
    )
    .expect("engine construction succeeds");

    let report = engine.run_cycle().await;

    assert_eq!(dispatcher.request_count(), 0, "no update on empty lookup");
    assert_eq!(report.lookup_failed, vec!["example.com"]);
}

#[tokio::test]
async fn failed_update_does_not_abort_other_domains() {
    let resolver = StaticResolver::new()
        .with("a.example.com", &[[1, 2, 3, 4]])
        .with("b.example.com", &[[1, 2, 3, 4]]);
    let dispatcher = RecordingDispatcher::new().failing_for("a.example.com");

    let (engine, mut event_rx) = DdnsEngine::new(
        Box::new(FixedIpSource::new(Ipv4Addr::new(5, 6, 7, 8))),
        Box::new(resolver),
        Box::new(dispatcher.clone()),
        minimal_config(&["a.example.com", "b.example.com"]),
    )
    .expect("engine construction succeeds");

    let report = engine.run_cycle().await;

    assert_eq!(
        dispatcher.hostnames(),
        vec!["a.example.com", "b.example.com"],
        "failure is attempted once, the next domain still runs"
    );
    assert_eq!(report.failed, vec!["a.example.com"]);
    assert_eq!(report.dispatched, vec!["b.example.com"]);

    let events = drain_events(&mut event_rx);
    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::UpdateFailed { hostname, .. } if hostname == "a.example.com"
    )));
}

#[tokio::test]
async fn failed_domain_update_still_attempts_wildcard() {
    let resolver = StaticResolver::new().with("example.com", &[[1, 2, 3, 4]]);
    let dispatcher = RecordingDispatcher::new().failing_for("example.com");

    let (engine, _event_rx) = DdnsEngine::new(
        Box::new(FixedIpSource::new(Ipv4Addr::new(5, 6, 7, 8))),
        Box::new(resolver),
        Box::new(dispatcher.clone()),
        minimal_config(&["example.com"]).with_wildcard(true),
    )
    .expect("engine construction succeeds");

    let report = engine.run_cycle().await;

    assert_eq!(dispatcher.hostnames(), vec!["example.com", "*.example.com"]);
    assert_eq!(report.dispatched, vec!["*.example.com"]);
}

#[tokio::test]
async fn failed_update_is_retried_next_cycle_only() {
    let resolver = StaticResolver::new().with("example.com", &[[1, 2, 3, 4]]);
    let dispatcher = RecordingDispatcher::new().failing_for("example.com");

    let (engine, _event_rx) = DdnsEngine::new(
        Box::new(FixedIpSource::new(Ipv4Addr::new(5, 6, 7, 8))),
        Box::new(resolver),
        Box::new(dispatcher.clone()),
        minimal_config(&["example.com"]),
    )
    .expect("engine construction succeeds");

    engine.run_cycle().await;
    assert_eq!(dispatcher.request_count(), 1);

    engine.run_cycle().await;
    assert_eq!(dispatcher.request_count(), 2);
}
