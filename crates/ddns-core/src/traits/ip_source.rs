// # IP Source Trait
//
// Defines the interface for asking one external service for the host's
// public IPv4 address.
//
// ## Implementations
//
// - HTTP-based: `ddns-ip-http` crate (raw text, JSON field, embedded text)
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
//     let address = source.fetch().await?;
//     println!("{} says we are {}", source.name(), address);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::address::Address;

/// Trait for IP source implementations
///
/// One call to [`IpSource::fetch`] is one outbound request. Sources do not
/// retry and do not cache: the public IP resolver decides what happens after
/// a failure, and the scheduler's next tick is the only retry mechanism.
///
/// # Errors
///
/// Implementations report failures as values, never by panicking:
/// - `Error::SourceUnreachable`: network error, timeout, non-2xx status
/// - `Error::ParseFailure`: the response did not have the expected shape
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Query the source once and return the address it reports
    async fn fetch(&self) -> Result<Address, crate::Error>;

    /// Short name used in logs and aggregated errors
    fn name(&self) -> &str;
}
