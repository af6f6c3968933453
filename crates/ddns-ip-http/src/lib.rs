// # HTTP IP Source
//
// This crate provides the HTTP-based IP sources for the DDNS system.
//
// ## Purpose
//
// Each [`HttpIpSource`] asks one external "what is my IP" service for the
// host's public IPv4 address with a single GET, then extracts the address
// from the response body using the endpoint's [`ParseStrategy`]:
//
// - `RawText`: the whole body, trimmed (e.g. icanhazip.com)
// - `JsonField`: a string field of a JSON object (e.g. httpbin.org/ip)
// - `Delimited`: text between two literals in an HTML page (e.g. checkip.dyndns.org)
//
// ## Architecture
//
// Sources do not poll, retry or cache. The public IP resolver in
// `ddns-core` tries them in order, and the scheduler's next tick is the
// only retry. A malformed response only fails the source that produced it.

use ddns_core::config::{IpSourceEndpoint, ParseStrategy, TransportConfig};
use ddns_core::traits::IpSource;
use ddns_core::{Address, Error, Result};

use tracing::debug;

/// Build the HTTP client shared by IP sources
///
/// Applies the per-call timeout, user agent and optional local bind address.
pub fn build_client(transport: &TransportConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(transport.request_timeout())
        .user_agent(transport.user_agent.as_str());

    if let Some(local) = transport.local_address {
        builder = builder.local_address(local);
    }

    builder
        .build()
        .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))
}

/// HTTP-based IP source
pub struct HttpIpSource {
    endpoint: IpSourceEndpoint,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source with its own client
    ///
    /// # Parameters
    ///
    /// - `endpoint`: URL and parse strategy of the service
    /// - `transport`: Timeout, user agent and local address for the client
    pub fn new(endpoint: IpSourceEndpoint, transport: &TransportConfig) -> Result<Self> {
        let client = build_client(transport)?;
        Self::with_client(endpoint, client)
    }

    /// Create a source that reuses an existing client
    pub fn with_client(endpoint: IpSourceEndpoint, client: reqwest::Client) -> Result<Self> {
        endpoint.validate()?;
        Ok(Self { endpoint, client })
    }

    /// Build one source per endpoint, all sharing a single client
    pub fn from_endpoints(
        endpoints: &[IpSourceEndpoint],
        transport: &TransportConfig,
    ) -> Result<Vec<Box<dyn IpSource>>> {
        let client = build_client(transport)?;
        endpoints
            .iter()
            .map(|endpoint| {
                Self::with_client(endpoint.clone(), client.clone())
                    .map(|source| Box::new(source) as Box<dyn IpSource>)
            })
            .collect()
    }

    /// The endpoint this source queries
    pub fn endpoint(&self) -> &IpSourceEndpoint {
        &self.endpoint
    }

    async fn fetch_body(&self) -> Result<String> {
        let name = &self.endpoint.name;

        let response = self
            .client
            .get(&self.endpoint.url)
            .send()
            .await
            .map_err(|e| Error::source_unreachable(name, describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::source_unreachable(name, format!("HTTP error: {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| Error::source_unreachable(name, format!("Failed to read response: {}", e)))
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn fetch(&self) -> Result<Address> {
        let body = self.fetch_body().await?;

        let address = extract_address(&self.endpoint.strategy, &body)
            .map_err(|message| Error::parse_failure(&self.endpoint.name, message))?;

        debug!("{} answered {}", self.endpoint.url, address);
        Ok(address)
    }

    fn name(&self) -> &str {
        &self.endpoint.name
    }
}

/// Extract the address from a response body
///
/// Returns a human-readable reason on failure; the caller attaches the
/// source name.
pub fn extract_address(strategy: &ParseStrategy, body: &str) -> std::result::Result<Address, String> {
    let text = match strategy {
        ParseStrategy::RawText => body.to_string(),
        ParseStrategy::JsonField { field } => json_field(body, field)?,
        ParseStrategy::Delimited { prefix, suffix } => delimited(body, prefix, suffix)?.to_string(),
    };

    text.parse::<Address>().map_err(|e| e.to_string())
}

fn json_field(body: &str, field: &str) -> std::result::Result<String, String> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| format!("Invalid JSON: {}", e))?;

    match value.get(field) {
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(format!("Field '{}' is not a string: {}", field, other)),
        None => Err(format!("Missing field '{}'", field)),
    }
}

fn delimited<'a>(body: &'a str, prefix: &str, suffix: &str) -> std::result::Result<&'a str, String> {
    let start = body
        .find(prefix)
        .map(|i| i + prefix.len())
        .ok_or_else(|| format!("Marker '{}' not found", prefix))?;

    let len = body[start..]
        .find(suffix)
        .ok_or_else(|| format!("Marker '{}' not found after '{}'", suffix, prefix))?;

    Ok(&body[start..start + len])
}

/// Short description of a transport error
fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "Request timed out".to_string()
    } else if err.is_connect() {
        format!("Connection failed: {}", err)
    } else {
        format!("Request failed: {}", err)
    }
}
