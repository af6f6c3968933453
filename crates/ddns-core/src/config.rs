//! Configuration types for the DDNS system
//!
//! This module defines all configuration structures used throughout the crate.
//! A [`DdnsConfig`] is built once at startup and never mutated afterwards;
//! components receive the parts they need at construction time.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Main DDNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Public IP sources, in preference order
    #[serde(default = "default_sources")]
    pub sources: Vec<IpSourceEndpoint>,

    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// The record being kept in sync
    pub target: TargetConfig,

    /// Record settings sent with every update
    #[serde(default)]
    pub record: RecordConfig,

    /// Tick cadence
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Outbound HTTP/DNS call settings
    #[serde(default)]
    pub transport: TransportConfig,
}

impl DdnsConfig {
    /// Create a configuration with the default sources and settings
    pub fn new(provider: ProviderConfig, target: TargetConfig) -> Self {
        Self {
            sources: default_sources(),
            provider,
            target,
            record: RecordConfig::default(),
            scheduler: SchedulerConfig::default(),
            transport: TransportConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.sources.is_empty() {
            return Err(crate::Error::config("No IP sources configured"));
        }

        for source in &self.sources {
            source.validate()?;
        }

        self.provider.validate()?;
        self.target.validate()?;
        self.record.validate()?;
        self.scheduler.validate()?;
        self.transport.validate()?;

        if self.transport.request_timeout() >= self.scheduler.interval() {
            return Err(crate::Error::config(
                "Request timeout must be shorter than the tick interval",
            ));
        }

        Ok(())
    }
}

/// How an address is extracted from an IP source's response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParseStrategy {
    /// The whole body, trimmed, is the address
    RawText,

    /// The body is a JSON object; the address is a string field
    JsonField {
        /// Field holding the address (e.g. "origin")
        field: String,
    },

    /// The address sits between two literals embedded in the body
    Delimited {
        /// Literal immediately preceding the address
        prefix: String,
        /// Literal terminating the address
        suffix: String,
    },
}

/// One external "what is my IP" endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpSourceEndpoint {
    /// Short name used in logs
    pub name: String,

    /// URL queried with a single GET
    pub url: String,

    /// How to read the address out of the response
    pub strategy: ParseStrategy,
}

impl IpSourceEndpoint {
    /// Create a new endpoint
    pub fn new(name: impl Into<String>, url: impl Into<String>, strategy: ParseStrategy) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            strategy,
        }
    }

    /// Validate the endpoint
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.name.trim().is_empty() {
            return Err(crate::Error::config("IP source name cannot be empty"));
        }

        if !is_http_url(&self.url) {
            return Err(crate::Error::config(format!(
                "IP source '{}' must use an http:// or https:// URL, got: {}",
                self.name, self.url
            )));
        }

        match &self.strategy {
            ParseStrategy::RawText => {}
            ParseStrategy::JsonField { field } => {
                if field.is_empty() {
                    return Err(crate::Error::config(format!(
                        "IP source '{}' has an empty JSON field name",
                        self.name
                    )));
                }
            }
            ParseStrategy::Delimited { prefix, suffix } => {
                if prefix.is_empty() || suffix.is_empty() {
                    return Err(crate::Error::config(format!(
                        "IP source '{}' needs both a prefix and a suffix",
                        self.name
                    )));
                }
            }
        }

        Ok(())
    }
}

/// The built-in IP sources, in the order they are tried
pub fn default_sources() -> Vec<IpSourceEndpoint> {
    vec![
        IpSourceEndpoint::new(
            "httpbin",
            "https://httpbin.org/ip",
            ParseStrategy::JsonField {
                field: "origin".to_string(),
            },
        ),
        IpSourceEndpoint::new("icanhazip", "https://icanhazip.com", ParseStrategy::RawText),
        IpSourceEndpoint::new(
            "dyndns",
            "http://checkip.dyndns.org",
            ParseStrategy::Delimited {
                prefix: "Current IP Address: ".to_string(),
                suffix: "</body>".to_string(),
            },
        ),
    ]
}

/// DNS provider configuration (ArvanCloud record-update endpoint)
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key sent as `Authorization: ApiKey <key>`
    pub api_key: String,

    /// Record identifier appended to the base URL
    pub domain_id: String,

    /// Endpoint prefix, e.g. `https://napi.arvancloud.ir/cdn/4.0/domains/example.com/dns-records/`
    pub base_url: String,

    /// Log the update instead of sending it
    #[serde(default)]
    pub dry_run: bool,
}

// The API key must never end up in logs.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<REDACTED>")
            .field("domain_id", &self.domain_id)
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl ProviderConfig {
    /// Create a live provider configuration
    pub fn new(
        api_key: impl Into<String>,
        domain_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            domain_id: domain_id.into(),
            base_url: base_url.into(),
            dry_run: false,
        }
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The full record-update URL: `{base_url}{domain_id}`
    pub fn update_url(&self) -> String {
        format!("{}{}", self.base_url, self.domain_id)
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_key.trim().is_empty() {
            return Err(crate::Error::config("Provider API key cannot be empty"));
        }
        if self.domain_id.trim().is_empty() {
            return Err(crate::Error::config("Provider domain identifier cannot be empty"));
        }
        if !is_http_url(&self.base_url) {
            return Err(crate::Error::config(format!(
                "Provider base URL must use http:// or https://, got: {}",
                self.base_url
            )));
        }
        Ok(())
    }
}

/// The record kept in sync
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Record name sent in the update payload (usually the subdomain label)
    pub record_name: String,

    /// Fully-qualified hostname resolved to read the published address
    pub hostname: String,
}

impl TargetConfig {
    /// Create a new target
    pub fn new(record_name: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            record_name: record_name.into(),
            hostname: hostname.into(),
        }
    }

    /// Validate the target
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.record_name.trim().is_empty() {
            return Err(crate::Error::config("Record name cannot be empty"));
        }
        validate_domain_name(&self.hostname)
    }
}

/// Fixed record settings sent with every update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Time-to-live in seconds
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Weight of the single address value
    #[serde(default = "default_weight")]
    pub weight: u32,

    /// Country code attached to the address value
    #[serde(default = "default_country")]
    pub country: String,

    /// Whether the record is proxied through the CDN
    #[serde(default)]
    pub cloud: bool,

    /// Upstream HTTPS mode
    #[serde(default = "default_upstream_https")]
    pub upstream_https: String,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            weight: default_weight(),
            country: default_country(),
            cloud: false,
            upstream_https: default_upstream_https(),
        }
    }
}

impl RecordConfig {
    /// Validate the record settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.ttl == 0 {
            return Err(crate::Error::config("Record TTL must be > 0"));
        }
        if self.country.len() != 2 || !self.country.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(crate::Error::config(format!(
                "Record country must be a two-letter uppercase code, got: {}",
                self.country
            )));
        }
        Ok(())
    }
}

fn default_ttl() -> u32 {
    120
}

fn default_weight() -> u32 {
    100
}

fn default_country() -> String {
    "IR".to_string()
}

fn default_upstream_https() -> String {
    "default".to_string()
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Interval between ticks (in seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Capacity of the scheduler event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl SchedulerConfig {
    /// Tick interval as a duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Validate the scheduler configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Tick interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

fn default_interval_secs() -> u64 {
    30 * 60
}

fn default_event_channel_capacity() -> usize {
    64
}

/// Settings shared by every outbound call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Per-call deadline (in seconds) for IP sources, DNS and the provider
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Local address outbound HTTP connections are bound to
    #[serde(default)]
    pub local_address: Option<IpAddr>,

    /// User-Agent header sent with HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            local_address: None,
            user_agent: default_user_agent(),
        }
    }
}

impl TransportConfig {
    /// Per-call deadline as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the transport configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.request_timeout_secs == 0 {
            return Err(crate::Error::config("Request timeout must be > 0"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(crate::Error::config("User agent cannot be empty"));
        }
        Ok(())
    }
}

fn default_request_timeout_secs() -> u64 {
    5
}

fn default_user_agent() -> String {
    concat!("ddnsd/", env!("CARGO_PKG_VERSION")).to_string()
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks: total length, label length, characters, hyphens.
pub fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    let domain = domain.strip_suffix('.').unwrap_or(domain);

    if domain.is_empty() {
        return Err(crate::Error::config("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(crate::Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}
