// # ddns-core
//
// Core library for the polling DDNS client.
//
// ## Architecture Overview
//
// This library provides the core functionality for dynamic DNS updates:
// - **IpSource**: Trait for learning the host's public IPv4 address
// - **DomainResolver**: Trait for reading the addresses a domain publishes
// - **UpdateDispatcher**: Trait for sending update requests to a provider
// - **DdnsEngine**: Poll loop that orchestrates resolve → compare → update
// - **DdnsConfig**: Validated configuration, loaded from the YAML `ddns.conf`
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Sequential Cycles**: One cycle at a time, one domain at a time
// 3. **Failures Are Transient**: Nothing after startup stops the loop
// 4. **Library-First**: All core functionality can be used as a library

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;
pub mod net;
pub mod resolver;

// Re-export core types for convenience
pub use traits::{IpSource, DomainResolver, UpdateDispatcher, UpdateResponse};
pub use engine::{DdnsEngine, EngineEvent, CycleReport};
pub use config::{DdnsConfig, Credentials};
pub use error::{Error, Result};
pub use resolver::SystemDomainResolver;
