//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Ask one external service for the public IP
//! - [`DnsLookup`]: Read the currently published address
//! - [`DnsProvider`]: Update the record via the provider API

pub mod dns_lookup;
pub mod dns_provider;
pub mod ip_source;

pub use dns_lookup::DnsLookup;
pub use dns_provider::DnsProvider;
pub use ip_source::IpSource;
