//! System resolver for published domain addresses
//!
//! Uses the operating system's resolver (`getaddrinfo` via tokio), not the
//! OpenDNS server used for the external IP, so the answer reflects what
//! ordinary clients of this host see.

use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::net::with_timeout;
use crate::traits::DomainResolver;

/// Domain resolver backed by the operating system
#[derive(Debug, Clone, Default)]
pub struct SystemDomainResolver {
    /// Upper bound for one lookup
    timeout: Option<Duration>,
}

impl SystemDomainResolver {
    /// Create a resolver with the given per-lookup timeout
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl DomainResolver for SystemDomainResolver {
    async fn lookup(&self, domain: &str) -> Result<Vec<IpAddr>> {
        let addrs = with_timeout(self.timeout, async {
            tokio::net::lookup_host((domain, 0))
                .await
                .map_err(|e| Error::lookup(domain, e.to_string()))
        })
        .await?;

        let ips = unique_ips(addrs);
        tracing::trace!("{} resolves to {:?}", domain, ips);
        Ok(ips)
    }
}

/// Keep each address once, in resolver order
///
/// getaddrinfo yields one entry per socket type, so the same address
/// usually shows up several times.
fn unique_ips(addrs: impl IntoIterator<Item = SocketAddr>) -> Vec<IpAddr> {
    let mut ips = Vec::new();
    for addr in addrs {
        let ip = addr.ip();
        if !ips.contains(&ip) {
            ips.push(ip);
        }
    }
    ips
}
