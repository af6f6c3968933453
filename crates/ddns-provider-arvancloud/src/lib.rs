// # ArvanCloud DNS Provider
//
// This crate provides the ArvanCloud DNS provider implementation for the
// DDNS system.
//
// ## Behavior
//
// - Makes exactly ONE HTTP request per update (`PUT {base_url}{domain_id}`)
// - Any 2xx status is success; every other status is reported with its code
// - No retry, backoff or caching: the scheduler's next tick is the retry
// - Dry-run mode logs the intended request without sending it
//
// ## API Call
//
// ```http
// PUT /cdn/4.0/domains/example.com/dns-records/{record-id}
// Authorization: ApiKey <key>
// Content-Type: application/json
//
// {
//   "type": "a",
//   "name": "home",
//   "value": [{"ip": "203.0.113.9", "port": null, "weight": 100, "country": "IR"}],
//   "ttl": 120,
//   "cloud": false,
//   "upstream_https": "default",
//   "ip_filter_mode": {"count": "single", "order": "none", "geo_filter": "none"}
// }
// ```

use async_trait::async_trait;
use ddns_core::config::{ProviderConfig, TransportConfig};
use ddns_core::traits::DnsProvider;
use ddns_core::{Error, Result, UpdatePayload};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderValue};

/// Provider name used in logs and errors
const PROVIDER_NAME: &str = "arvancloud";

/// Longest response body kept in an error
const MAX_ERROR_BODY_LEN: usize = 512;

/// ArvanCloud DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Log the intended PUT URL and payload
/// - **NOT** send any request
/// - Report success
///
/// # Security
///
/// The `Authorization` header is marked sensitive and the Debug
/// implementation does NOT expose the API key.
pub struct ArvanCloudProvider {
    /// Pre-built `ApiKey <key>` header value
    /// ⚠️ NEVER log this value
    authorization: HeaderValue,

    /// `{base_url}{domain_id}`
    update_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    dry_run: bool,
}

impl std::fmt::Debug for ArvanCloudProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArvanCloudProvider")
            .field("api_key", &"<REDACTED>")
            .field("update_url", &self.update_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl ArvanCloudProvider {
    /// Create a new ArvanCloud provider
    ///
    /// # Parameters
    ///
    /// - `config`: API key, record identifier, endpoint prefix and dry-run flag
    /// - `transport`: Timeout, user agent and local address for the client
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid, the API key
    /// cannot be sent as a header, or the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig, transport: &TransportConfig) -> Result<Self> {
        config.validate()?;

        let mut authorization = HeaderValue::from_str(&format!("ApiKey {}", config.api_key))
            .map_err(|_| Error::config("Provider API key contains invalid header characters"))?;
        authorization.set_sensitive(true);

        let mut builder = reqwest::Client::builder()
            .timeout(transport.request_timeout())
            .user_agent(transport.user_agent.as_str());

        if let Some(local) = transport.local_address {
            builder = builder.local_address(local);
        }

        let client = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        if config.dry_run {
            tracing::warn!("ArvanCloud provider running in DRY-RUN mode - no changes will be made");
        }

        Ok(Self {
            authorization,
            update_url: config.update_url(),
            client,
            dry_run: config.dry_run,
        })
    }

    /// The URL updates are sent to
    pub fn update_url(&self) -> &str {
        &self.update_url
    }

    /// Whether updates are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

#[async_trait]
impl DnsProvider for ArvanCloudProvider {
    async fn update_record(&self, payload: &UpdatePayload) -> Result<()> {
        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                self.update_url,
                serde_json::to_string(payload)?
            );
            return Ok(());
        }

        tracing::debug!("PUT {} for record {}", self.update_url, payload.name);

        let response = self
            .client
            .put(&self.update_url)
            .header(AUTHORIZATION, self.authorization.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::provider_transport(PROVIDER_NAME, describe(&e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        truncate_on_char_boundary(&mut body, MAX_ERROR_BODY_LEN);

        if let Some(hint) = status_hint(status) {
            tracing::warn!("ArvanCloud answered {}: {}", status, hint);
        }

        Err(Error::provider_status(PROVIDER_NAME, status.as_u16(), body))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Operator hint for well-known failure statuses
fn status_hint(status: StatusCode) -> Option<&'static str> {
    match status.as_u16() {
        401 | 403 => Some("authentication failed, check the API key and its permissions"),
        404 => Some("record not found, check the domain and record identifier"),
        422 => Some("payload rejected, check the record settings"),
        429 => Some("rate limit exceeded"),
        500..=599 => Some("server error (transient)"),
        _ => None,
    }
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "Request timed out".to_string()
    } else if err.is_connect() {
        format!("Connection failed: {}", err)
    } else {
        format!("HTTP request failed: {}", err)
    }
}

fn truncate_on_char_boundary(s: &mut String, max: usize) {
    if s.len() > max {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        s.truncate(end);
    }
}
