// # System DNS Lookup
//
// Resolves the target hostname through the host's resolver configuration
// (`getaddrinfo` on a blocking thread, as done by `tokio::net::lookup_host`).
//
// No caching is done here: every tick sees a fresh answer, subject only to
// whatever caching the host resolver itself applies.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::address::Address;
use crate::error::{Error, Result};
use crate::traits::DnsLookup;

/// [`DnsLookup`] backed by the operating system resolver
#[derive(Debug, Clone)]
pub struct SystemDnsLookup {
    timeout: Duration,
}

impl SystemDnsLookup {
    /// Create a lookup whose queries give up after `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl DnsLookup for SystemDnsLookup {
    async fn lookup(&self, hostname: &str) -> Result<Address> {
        let query = tokio::net::lookup_host((hostname, 0));

        let answers = match tokio::time::timeout(self.timeout, query).await {
            Ok(Ok(answers)) => answers,
            Ok(Err(e)) => return Err(Error::resolution_failed(hostname, e.to_string())),
            Err(_) => {
                return Err(Error::resolution_failed(
                    hostname,
                    format!("timed out after {:?}", self.timeout),
                ));
            }
        };

        let address = first_ipv4(answers)
            .ok_or_else(|| Error::resolution_failed(hostname, "no IPv4 address in answer"))?;

        debug!("{} currently resolves to {}", hostname, address);
        Ok(address)
    }
}

/// First IPv4 entry of a resolver answer, in answer order
fn first_ipv4(answers: impl IntoIterator<Item = SocketAddr>) -> Option<Address> {
    answers.into_iter().find_map(|addr| match addr.ip() {
        IpAddr::V4(ip) => Some(Address::new(ip)),
        IpAddr::V6(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_first_ipv4_skips_ipv6() {
        let answers = vec![
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 0),
            SocketAddr::new(IpAddr::V4(Ipv4Addr::new(198, 51, 100, 4)), 0),
            SocketAddr::new(IpAddr::V4(Ipv4Addr::new(198, 51, 100, 5)), 0),
        ];

        assert_eq!(
            first_ipv4(answers),
            Some(Address::new(Ipv4Addr::new(198, 51, 100, 4)))
        );
    }

    #[test]
    fn test_first_ipv4_none_for_ipv6_only() {
        let answers = vec![SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 0)];
        assert_eq!(first_ipv4(answers), None);
    }

    #[tokio::test]
    async fn test_ip_literal_resolves_without_network() {
        let lookup = SystemDnsLookup::new(Duration::from_secs(5));
        let address = lookup.lookup("192.0.2.10").await.unwrap();
        assert_eq!(address.to_string(), "192.0.2.10");
    }

    #[tokio::test]
    async fn test_unresolvable_name_is_resolution_failure() {
        let lookup = SystemDnsLookup::new(Duration::from_secs(5));
        let err = lookup.lookup("does-not-exist.invalid").await.unwrap_err();
        assert!(matches!(err, Error::ResolutionFailed { .. }));
    }
}
