// # Update Dispatcher Trait
//
// Defines the interface for telling a dynamic-DNS provider to republish
// a host name.
//
// ## Implementations
//
// - Templated dyndns2-style GET: `ddns-provider-dyndns` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::UpdateDispatcher;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let dispatcher = /* UpdateDispatcher implementation */;
//
//     let response = dispatcher
//         .dispatch_update("example.com", std::net::Ipv4Addr::new(5, 6, 7, 8))
//         .await?;
//     println!("{}: {}", response.status, response.body);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Outcome of one update request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResponse {
    /// HTTP status code returned by the provider
    pub status: u16,
    /// Full response body (read so the connection is released)
    pub body: String,
}

/// Trait for update dispatchers
///
/// A dispatcher performs exactly one request per call. It does not decide
/// whether an update is needed and does not retry; both belong to the
/// engine, which retries on the next poll cycle.
#[async_trait]
pub trait UpdateDispatcher: Send + Sync {
    /// Ask the provider to point `hostname` at `ip`
    ///
    /// # Parameters
    ///
    /// - `hostname`: The host to update (e.g. "example.com" or "*.example.com")
    /// - `ip`: The external IP that triggered the update
    ///
    /// # Returns
    ///
    /// - `Ok(UpdateResponse)`: The provider answered with a success status
    /// - `Err(Error)`: Request construction, transport or non-success status
    async fn dispatch_update(
        &self,
        hostname: &str,
        ip: Ipv4Addr,
    ) -> Result<UpdateResponse, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
