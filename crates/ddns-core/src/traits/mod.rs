//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Learn the host's public IPv4 address
//! - [`DomainResolver`]: Read the addresses a domain currently publishes
//! - [`UpdateDispatcher`]: Ask the provider to republish a host name

pub mod ip_source;
pub mod domain_resolver;
pub mod dispatcher;

pub use ip_source::IpSource;
pub use domain_resolver::DomainResolver;
pub use dispatcher::{UpdateDispatcher, UpdateResponse};
