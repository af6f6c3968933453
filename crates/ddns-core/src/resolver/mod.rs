//! Public IP resolver
//!
//! Tries an ordered list of [`IpSource`]s and returns the first address one
//! of them produces.
//!
//! ## Fallback
//!
//! ```text
//! source 1 ── fail ──▶ source 2 ── fail ──▶ source 3 ── fail ──▶ DiscoveryFailed
//!    │                    │                    │
//!    └── ok ──▶ Address   └── ok ──▶ Address   └── ok ──▶ Address
//! ```
//!
//! Per-source failures are logged and never escape the resolver except as
//! the aggregate [`Error::DiscoveryFailed`]. Each source is asked at most
//! once per call.

use crate::address::Address;
use crate::error::{Error, Result};
use crate::traits::IpSource;
use tracing::{debug, warn};

/// Ordered multi-source public IP discovery
pub struct PublicIpResolver {
    sources: Vec<Box<dyn IpSource>>,
}

impl PublicIpResolver {
    /// Create a resolver over `sources`, tried in the given order
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `sources` is empty.
    pub fn new(sources: Vec<Box<dyn IpSource>>) -> Result<Self> {
        if sources.is_empty() {
            return Err(Error::config("Public IP resolver needs at least one source"));
        }
        Ok(Self { sources })
    }

    /// Names of the configured sources, in order
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Discover the public address
    ///
    /// # Returns
    ///
    /// - `Ok(Address)`: The first successful source's answer
    /// - `Err(Error::DiscoveryFailed)`: Every source failed; the message
    ///   lists each source's failure in order
    pub async fn resolve(&self) -> Result<Address> {
        let mut failures = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            match source.fetch().await {
                Ok(address) => {
                    debug!("IP source {} reported {}", source.name(), address);
                    return Ok(address);
                }
                Err(e) => {
                    warn!("IP retrieval failed for {}: {}", source.name(), e);
                    failures.push(format!("{}: {}", source.name(), e));
                }
            }
        }

        Err(Error::discovery_failed(format!(
            "all {} IP sources failed ({})",
            self.sources.len(),
            failures.join("; ")
        )))
    }
}
