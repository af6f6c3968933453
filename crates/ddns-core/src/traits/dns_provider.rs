// # DNS Provider Trait
//
// Defines the interface for pushing a record update to the DNS provider.
//
// ## Implementations
//
// - ArvanCloud: `ddns-provider-arvancloud` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{DnsProvider, UpdatePayload};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let payload = UpdatePayload::new("home", "203.0.113.9".parse()?, &Default::default());
//     provider.update_record(&payload).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::record::UpdatePayload;

/// Trait for DNS provider implementations
///
/// # Single-shot
///
/// Each call issues exactly one update request. Providers:
/// - do not decide whether an update is needed (owned by the `Reconciler`)
/// - do not retry or back off (the next scheduler tick is the retry)
/// - do not spawn tasks or keep state between calls
///
/// # Outcome
///
/// - `Ok(())`: the provider answered with a 2xx status
/// - `Err(Error::ProviderStatus)`: any other status
/// - `Err(Error::ProviderTransport)`: the request could not be completed
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Publish the payload's address for its record
    async fn update_record(&self, payload: &UpdatePayload) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
