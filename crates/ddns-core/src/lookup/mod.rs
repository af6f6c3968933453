//! DNS lookup implementations
//!
//! - [`SystemDnsLookup`]: the host's configured resolver, via tokio

mod system;

pub use system::SystemDnsLookup;
