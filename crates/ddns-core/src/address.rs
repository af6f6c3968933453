// # Address
//
// The IPv4 address value compared and published by the reconciler.
//
// An `Address` only exists in well-formed dotted-quad form. There is no
// "unresolved" value: a failed discovery is the `Err` side of a `Result`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::Error;

/// A canonical dotted-quad IPv4 address
///
/// Parsing trims surrounding whitespace and then requires the standard
/// dotted-quad form; leading zeros, IPv6 literals and trailing text are
/// rejected. Two addresses are equal exactly when their dotted-quad text is
/// equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(Ipv4Addr);

impl Address {
    /// Wrap an already-parsed IPv4 address
    pub const fn new(ip: Ipv4Addr) -> Self {
        Self(ip)
    }

    /// The underlying IPv4 address
    pub fn ip(&self) -> Ipv4Addr {
        self.0
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<Ipv4Addr>()
            .map(Self)
            .map_err(|_| Error::InvalidAddress(trimmed.to_string()))
    }
}

impl TryFrom<String> for Address {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl From<Ipv4Addr> for Address {
    fn from(ip: Ipv4Addr) -> Self {
        Self(ip)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        let address: Address = " 203.0.113.5\n".parse().unwrap();
        assert_eq!(address.to_string(), "203.0.113.5");
    }

    #[test]
    fn test_rejects_fragments_and_other_families() {
        for text in ["", "203.0.113", "203.0.113.5.1", "::1", "203.0.113.5 extra", "unresolved"] {
            assert!(text.parse::<Address>().is_err(), "{text:?} should not parse");
        }
    }

    #[test]
    fn test_no_leading_zero_normalization() {
        assert!("203.0.113.05".parse::<Address>().is_err());
    }

    #[test]
    fn test_equality_is_textual() {
        let a: Address = "203.0.113.5".parse().unwrap();
        let b = Address::new(Ipv4Addr::new(203, 0, 113, 5));
        let c: Address = "203.0.113.9".parse().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_serializes_as_string() {
        let address: Address = "198.51.100.7".parse().unwrap();
        assert_eq!(serde_json::to_string(&address).unwrap(), "\"198.51.100.7\"");
    }
}
