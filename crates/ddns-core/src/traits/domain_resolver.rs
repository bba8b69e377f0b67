// # Domain Resolver Trait
//
// Defines the interface for reading the addresses a domain currently
// publishes. The engine compares these against the external IP.

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for published-address lookups
///
/// An empty list and an error mean the same thing to the engine: no
/// information, so the domain is skipped for this cycle rather than updated.
#[async_trait]
pub trait DomainResolver: Send + Sync {
    /// Look up the addresses currently published for `domain`
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<IpAddr>)`: Published addresses in resolver order (possibly empty)
    /// - `Err(Error)`: If resolution failed
    async fn lookup(&self, domain: &str) -> Result<Vec<IpAddr>, crate::Error>;
}
