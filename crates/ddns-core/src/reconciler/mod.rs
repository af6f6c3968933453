//! Reconciler
//!
//! One reconciliation cycle compares the discovered public address with the
//! address currently published in DNS and updates the record only when they
//! differ.
//!
//! ## Cycle
//!
//! ```text
//! Idle ──▶ Discovering ──▶ Comparing ──┬──▶ Done      (NoChangeNeeded)
//!              │                       │
//!              │                       └──▶ Updating ──▶ UpdateSucceeded
//!              │                                     └─▶ UpdateFailed
//!              └── either side failed ──▶ DiscoveryFailed
//! ```
//!
//! Public IP discovery and the DNS lookup have no ordering dependency and
//! run concurrently; both must finish before comparing. At most one provider
//! call is made per cycle, and none when nothing changed.

use std::fmt;

use tracing::{debug, error, info, warn};

use crate::address::Address;
use crate::config::{RecordConfig, TargetConfig};
use crate::record::UpdatePayload;
use crate::resolver::PublicIpResolver;
use crate::traits::{DnsLookup, DnsProvider};

/// Outcome of one reconciliation cycle
///
/// Produced once per tick and only consumed by logging and scheduler events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationResult {
    /// DNS already publishes the public address
    NoChangeNeeded {
        address: Address,
    },

    /// The provider accepted the new address
    UpdateSucceeded {
        previous: Address,
        current: Address,
    },

    /// The provider rejected the update or could not be reached
    UpdateFailed {
        address: Address,
        reason: String,
    },

    /// The public address or the published address could not be determined
    DiscoveryFailed {
        reason: String,
    },
}

impl ReconciliationResult {
    /// True when the cycle called the provider
    pub fn attempted_update(&self) -> bool {
        matches!(self, Self::UpdateSucceeded { .. } | Self::UpdateFailed { .. })
    }
}

impl fmt::Display for ReconciliationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoChangeNeeded { address } => write!(f, "no change needed ({})", address),
            Self::UpdateSucceeded { previous, current } => {
                write!(f, "updated {} -> {}", previous, current)
            }
            Self::UpdateFailed { address, reason } => {
                write!(f, "update to {} failed: {}", address, reason)
            }
            Self::DiscoveryFailed { reason } => write!(f, "discovery failed: {}", reason),
        }
    }
}

/// Runs reconciliation cycles for one target record
///
/// All collaborators and configuration are fixed at construction; a
/// `Reconciler` holds no state between cycles.
pub struct Reconciler {
    resolver: PublicIpResolver,
    lookup: Box<dyn DnsLookup>,
    provider: Box<dyn DnsProvider>,
    target: TargetConfig,
    record: RecordConfig,
}

impl Reconciler {
    /// Create a reconciler
    ///
    /// # Parameters
    ///
    /// - `resolver`: Public IP discovery
    /// - `lookup`: Reads the currently published address of `target.hostname`
    /// - `provider`: Applies record updates
    /// - `target`: Record name and hostname being kept in sync
    /// - `record`: Record settings sent with every update
    pub fn new(
        resolver: PublicIpResolver,
        lookup: Box<dyn DnsLookup>,
        provider: Box<dyn DnsProvider>,
        target: TargetConfig,
        record: RecordConfig,
    ) -> Self {
        Self {
            resolver,
            lookup,
            provider,
            target,
            record,
        }
    }

    /// Hostname whose published address is compared
    pub fn hostname(&self) -> &str {
        &self.target.hostname
    }

    /// Run one cycle
    ///
    /// Never returns an error: every failure is folded into the result so
    /// the caller can keep ticking.
    pub async fn reconcile(&self) -> ReconciliationResult {
        let (public, published) = tokio::join!(
            self.resolver.resolve(),
            self.lookup.lookup(&self.target.hostname)
        );

        let (public, published) = match (public, published) {
            (Ok(public), Ok(published)) => (public, published),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Skipping update for {}: {}", self.target.hostname, e);
                return ReconciliationResult::DiscoveryFailed {
                    reason: e.to_string(),
                };
            }
        };

        if public == published {
            info!("{} already points at {}, no update needed", self.target.hostname, public);
            return ReconciliationResult::NoChangeNeeded { address: public };
        }

        info!(
            "Public IP {} differs from published {} for {}, updating",
            public, published, self.target.hostname
        );

        let payload = UpdatePayload::new(&self.target.record_name, public, &self.record);
        debug!("Sending update for record {} to {}", payload.name, self.provider.provider_name());

        match self.provider.update_record(&payload).await {
            Ok(()) => {
                info!("Updated {}: {} -> {}", self.target.hostname, published, public);
                ReconciliationResult::UpdateSucceeded {
                    previous: published,
                    current: public,
                }
            }
            Err(e) => {
                error!("Failed to update {} to {}: {}", self.target.hostname, public, e);
                ReconciliationResult::UpdateFailed {
                    address: public,
                    reason: e.to_string(),
                }
            }
        }
    }
}
