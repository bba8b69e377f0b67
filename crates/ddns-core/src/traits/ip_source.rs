// # IP Source Trait
//
// Defines the interface for learning the host's public IPv4 address.
//
// ## Implementations
//
// - OpenDNS (`myip.opendns.com`): `ddns-ip-opendns` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let public_ip = source.current().await?;
//     println!("public address: {}", public_ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for external IP resolvers
///
/// One call is one lookup: implementations must not cache between calls,
/// since the engine asks exactly once per poll cycle and expects a fresh
/// answer every time.
///
/// # Failure
///
/// Every failure (transport, empty answer, unexpected record type) is
/// returned as an error. The engine treats any error as "external IP
/// unknown for this cycle" and never stops because of it.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Resolve the caller's current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The public address as seen by the remote resolver
    /// - `Err(Error)`: If the address could not be determined
    async fn current(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Name of the source (for logging)
    fn source_name(&self) -> &'static str;
}
