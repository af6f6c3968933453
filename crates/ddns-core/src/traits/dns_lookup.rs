// # DNS Lookup Trait
//
// Defines the interface for reading the address currently published for
// the target hostname.
//
// ## Implementations
//
// - System resolver: [`crate::lookup::SystemDnsLookup`]
//
// The answer is "ground truth as currently published" and is only used for
// comparison. Only the first IPv4 answer counts, consistent with a
// single-value address record.

use async_trait::async_trait;

use crate::address::Address;

/// Trait for DNS lookup implementations
#[async_trait]
pub trait DnsLookup: Send + Sync {
    /// Resolve `hostname` and return its first IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Address)`: The first IPv4 address in the answer
    /// - `Err(Error::ResolutionFailed)`: Resolution errored, timed out, or
    ///   returned no IPv4 address
    async fn lookup(&self, hostname: &str) -> Result<Address, crate::Error>;
}
