// # ddns-core
//
// Core library for the DDNS reconciliation loop.
//
// ## Architecture Overview
//
// This library keeps one DNS address record in sync with the host's public
// IPv4 address:
// - **IpSource**: Trait for asking one external service for the public IP
// - **PublicIpResolver**: Ordered multi-source discovery with fallback
// - **DnsLookup**: Trait for reading the currently published address
// - **DnsProvider**: Trait for updating the record via the provider API
// - **Reconciler**: Compares both addresses and updates only on mismatch
// - **Scheduler**: Fires the Reconciler on a fixed interval, single-flight
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from HTTP/provider implementations
// 2. **No Redundant Writes**: The provider is only called when DNS is stale
// 3. **Failure Isolation**: No tick outcome is fatal; the next tick is the retry
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Immutable Configuration**: Built once at startup and passed explicitly

pub mod address;
pub mod config;
pub mod error;
pub mod lookup;
pub mod reconciler;
pub mod record;
pub mod resolver;
pub mod scheduler;
pub mod traits;

// Re-export core types for convenience
pub use address::Address;
pub use config::{
    DdnsConfig, IpSourceEndpoint, ParseStrategy, ProviderConfig, RecordConfig, SchedulerConfig,
    TargetConfig, TransportConfig,
};
pub use error::{Error, Result};
pub use lookup::SystemDnsLookup;
pub use reconciler::{ReconciliationResult, Reconciler};
pub use record::UpdatePayload;
pub use resolver::PublicIpResolver;
pub use scheduler::{Scheduler, SchedulerEvent};
pub use traits::{DnsLookup, DnsProvider, IpSource};
