//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Resolving the external IP once per cycle via IpSource
//! - Looking up each configured domain via DomainResolver
//! - Dispatching an update via UpdateDispatcher when a domain is stale
//! - Sleeping for the configured frequency and starting over
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  IpSource   │─── external IP ─────┐
//! └─────────────┘                     │
//!                                     ▼
//!                            ┌──────────────┐
//!                            │ DdnsEngine   │
//!                            └──────────────┘
//!                                     │
//!         ┌───────────────────────────┼───────────────────────────┐
//!         │                           │                           │
//!         ▼                           ▼                           ▼
//! ┌────────────────┐        ┌──────────────────┐        ┌─────────────┐
//! │ DomainResolver │        │ UpdateDispatcher │        │   Events    │
//! │ (compare)      │        │ (update)         │        │  (notify)   │
//! └────────────────┘        └──────────────────┘        └─────────────┘
//! ```
//!
//! ## Cycle
//!
//! 1. Resolve the external IP; if unknown, skip the whole cycle
//! 2. For each domain, in order: look up its published addresses
//! 3. If the lookup failed or is empty, skip the domain
//! 4. If the external IP is not published, dispatch an update
//!    (and one for `*.domain` when wildcard updates are enabled)
//! 5. Sleep for the configured frequency

use crate::config::DdnsConfig;
use crate::error::Result;
use crate::traits::{DomainResolver, IpSource, UpdateDispatcher};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Capacity of the engine event channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        domains_count: usize,
    },

    /// A poll cycle began
    CycleStarted,

    /// External IP resolved
    ExternalIpResolved {
        ip: Ipv4Addr,
    },

    /// External IP unknown; the cycle is skipped
    ExternalIpUnavailable {
        error: String,
    },

    /// Domain lookup failed or returned nothing; the domain is skipped
    DomainLookupFailed {
        domain: String,
        error: String,
    },

    /// Domain already publishes the external IP
    DomainUpToDate {
        domain: String,
        ip: Ipv4Addr,
    },

    /// Update accepted by the provider
    UpdateDispatched {
        hostname: String,
        ip: Ipv4Addr,
        status: u16,
    },

    /// Update request failed
    UpdateFailed {
        hostname: String,
        error: String,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// What a single poll cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// External IP used for comparisons, `None` when it could not be resolved
    pub external_ip: Option<Ipv4Addr>,
    /// Domains that already published the external IP
    pub up_to_date: Vec<String>,
    /// Domains skipped because their lookup failed or was empty
    pub lookup_failed: Vec<String>,
    /// Host names the provider accepted an update for
    pub dispatched: Vec<String>,
    /// Host names whose update request failed
    pub failed: Vec<String>,
}

/// Core DDNS engine
///
/// The engine orchestrates the poll → compare → update flow.
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Start with [`DdnsEngine::run_with_shutdown()`]
/// 3. Engine polls until the shutdown signal is received
///
/// ## Threading
///
/// Everything inside a cycle is sequential: one external IP query, then one
/// lookup and at most two update requests per domain, domain after domain.
/// Providers rate limit, so updates are never fanned out.
pub struct DdnsEngine {
    /// External IP resolver
    ip_source: Box<dyn IpSource>,

    /// Published-address lookups
    resolver: Box<dyn DomainResolver>,

    /// Provider update requests
    dispatcher: Box<dyn UpdateDispatcher>,

    /// Domains to manage
    domains: Vec<String>,

    /// Also update `*.domain`
    wildcard: bool,

    /// Delay between cycles
    frequency: Duration,

    /// Log transient failures
    debug: bool,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Parameters
    ///
    /// - `ip_source`: External IP resolver
    /// - `resolver`: Domain resolver
    /// - `dispatcher`: Update dispatcher
    /// - `config`: DDNS configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events.
    /// Fails with a configuration error if no domains are configured.
    pub fn new(
        ip_source: Box<dyn IpSource>,
        resolver: Box<dyn DomainResolver>,
        dispatcher: Box<dyn UpdateDispatcher>,
        config: DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let engine = Self {
            ip_source,
            resolver,
            dispatcher,
            domains: config.domains,
            wildcard: config.wildcard,
            frequency: config.frequency,
            debug: config.debug,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Domains managed by this engine
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Run the engine until `shutdown_rx` fires
    ///
    /// A dropped sender counts as a shutdown request. The signal interrupts
    /// both the sleep between cycles and a cycle in progress.
    pub async fn run_with_shutdown(&self, shutdown_rx: oneshot::Receiver<()>) -> Result<()> {
        self.run_until(async {
            let _ = shutdown_rx.await;
        })
        .await
    }

    async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        self.emit_event(EngineEvent::Started {
            domains_count: self.domains.len(),
        });

        if self.debug {
            for domain in &self.domains {
                debug!("Starting update service for {}", domain);
            }
        }

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => break,

                _ = async {
                    self.run_cycle().await;
                    tokio::time::sleep(self.frequency).await;
                } => {}
            }
        }

        info!("Shutdown signal received");
        self.emit_event(EngineEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });

        Ok(())
    }

    /// Run exactly one poll cycle
    pub async fn run_cycle(&self) -> CycleReport {
        self.emit_event(EngineEvent::CycleStarted);

        let mut report = CycleReport::default();

        let external_ip = match self.ip_source.current().await {
            Ok(ip) => {
                debug!("External IP ({}): {}", self.ip_source.source_name(), ip);
                self.emit_event(EngineEvent::ExternalIpResolved { ip });
                ip
            }
            Err(e) => {
                if self.debug {
                    warn!("DNS error: {}", e);
                    for domain in &self.domains {
                        warn!("Skipping {}: external IP unknown", domain);
                    }
                }
                self.emit_event(EngineEvent::ExternalIpUnavailable {
                    error: e.to_string(),
                });
                return report;
            }
        };
        report.external_ip = Some(external_ip);

        for domain in &self.domains {
            self.check_domain(domain, external_ip, &mut report).await;
        }

        report
    }

    /// Compare one domain against the external IP and update it if stale
    async fn check_domain(&self, domain: &str, external_ip: Ipv4Addr, report: &mut CycleReport) {
        let published = match self.resolver.lookup(domain).await {
            Ok(ips) if !ips.is_empty() => ips,
            Ok(_) => {
                self.lookup_failed(domain, "no addresses published".to_string(), report);
                return;
            }
            Err(e) => {
                self.lookup_failed(domain, e.to_string(), report);
                return;
            }
        };

        if is_published(&published, external_ip) {
            debug!("{} already points at {}", domain, external_ip);
            self.emit_event(EngineEvent::DomainUpToDate {
                domain: domain.to_string(),
                ip: external_ip,
            });
            report.up_to_date.push(domain.to_string());
            return;
        }

        debug!(
            "{} publishes {:?}, external IP is {}",
            domain, published, external_ip
        );

        self.dispatch(domain, external_ip, report).await;
        if self.wildcard {
            self.dispatch(&format!("*.{}", domain), external_ip, report).await;
        }
    }

    /// Send one update request, recording the outcome
    async fn dispatch(&self, hostname: &str, ip: Ipv4Addr, report: &mut CycleReport) {
        match self.dispatcher.dispatch_update(hostname, ip).await {
            Ok(response) => {
                debug!("New IP for {}: {}", hostname, ip);
                if self.debug {
                    debug!("Response from ddns request:\n{}", response.body);
                }
                self.emit_event(EngineEvent::UpdateDispatched {
                    hostname: hostname.to_string(),
                    ip,
                    status: response.status,
                });
                report.dispatched.push(hostname.to_string());
            }
            Err(e) => {
                if self.debug {
                    warn!(
                        "Update of {} via {} failed: {}",
                        hostname,
                        self.dispatcher.provider_name(),
                        e
                    );
                }
                self.emit_event(EngineEvent::UpdateFailed {
                    hostname: hostname.to_string(),
                    error: e.to_string(),
                });
                report.failed.push(hostname.to_string());
            }
        }
    }

    fn lookup_failed(&self, domain: &str, error: String, report: &mut CycleReport) {
        if self.debug {
            warn!("DNS error for {}: {}", domain, error);
        }
        self.emit_event(EngineEvent::DomainLookupFailed {
            domain: domain.to_string(),
            error,
        });
        report.lookup_failed.push(domain.to_string());
    }

    /// Emit an engine event
    ///
    /// # Parameters
    ///
    /// - `event`: The event to emit
    fn emit_event(&self, event: EngineEvent) {
        // A full or closed channel drops the event; the loop never blocks on observers
        if let Err(mpsc::error::TrySendError::Full(_)) = self.event_tx.try_send(event) {
            warn!("Event channel full, dropping event");
        }
    }
}

/// Whether `external_ip` is among the published addresses
///
/// Address equality on IPv4 is the same as comparing canonical dotted-quad text.
pub fn is_published(published: &[IpAddr], external_ip: Ipv4Addr) -> bool {
    published.contains(&IpAddr::V4(external_ip))
}
