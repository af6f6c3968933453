// # Update Payload
//
// The record-update body sent to the provider. Built fresh for every
// update attempt from the configured record settings and the newly
// discovered address.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::config::RecordConfig;

/// Record type for address records
pub const ADDRESS_RECORD_TYPE: &str = "a";

/// The record-update request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePayload {
    /// Record type, always `"a"`
    #[serde(rename = "type")]
    pub record_type: String,

    /// Record (subdomain) name
    pub name: String,

    /// Exactly one address value
    pub value: Vec<RecordValue>,

    /// Time-to-live in seconds
    pub ttl: u32,

    /// Whether the record is proxied through the CDN
    pub cloud: bool,

    /// Upstream HTTPS mode
    pub upstream_https: String,

    /// How multiple values are served
    pub ip_filter_mode: IpFilterMode,
}

/// One address value of an A record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordValue {
    pub ip: Address,
    pub port: Option<u16>,
    pub weight: u32,
    pub country: String,
}

/// Value selection flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpFilterMode {
    pub count: String,
    pub order: String,
    pub geo_filter: String,
}

impl Default for IpFilterMode {
    fn default() -> Self {
        Self {
            count: "single".to_string(),
            order: "none".to_string(),
            geo_filter: "none".to_string(),
        }
    }
}

impl UpdatePayload {
    /// Build the payload publishing `address` under `record_name`
    pub fn new(record_name: &str, address: Address, record: &RecordConfig) -> Self {
        Self {
            record_type: ADDRESS_RECORD_TYPE.to_string(),
            name: record_name.to_string(),
            value: vec![RecordValue {
                ip: address,
                port: None,
                weight: record.weight,
                country: record.country.clone(),
            }],
            ttl: record.ttl,
            cloud: record.cloud,
            upstream_https: record.upstream_https.clone(),
            ip_filter_mode: IpFilterMode::default(),
        }
    }

    /// The address being published
    pub fn address(&self) -> Option<Address> {
        self.value.first().map(|value| value.ip)
    }
}
