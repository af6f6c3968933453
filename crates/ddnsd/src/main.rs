// # ddnsd - DDNS Daemon
//
// This daemon is a THIN integration layer:
// - No DNS, comparison or retry logic lives here
// - All DDNS logic is in ddns-core
// - Configuration is via environment variables ONLY (an optional `.env`
//   file is loaded first)
//
// The ddnsd daemon is responsible for:
// 1. Reading and validating configuration
// 2. Initializing logging and the runtime
// 3. Building the IP sources, DNS lookup and provider
// 4. Running the scheduler until SIGTERM/SIGINT
//
// ## Configuration
//
// ### Provider (required)
// - `DDNS_PROVIDER_API_KEY`: ArvanCloud API key
// - `DDNS_PROVIDER_DOMAIN_ID`: Record identifier appended to the base URL
// - `DDNS_PROVIDER_BASE_URL`: Record-update endpoint prefix
//
// ### Target (required)
// - `DDNS_RECORD_NAME`: Record (subdomain) name sent in the payload
// - `DDNS_HOSTNAME`: Fully-qualified name resolved for comparison
//
// ### Record
// - `DDNS_RECORD_TTL`: TTL in seconds (default 120)
// - `DDNS_RECORD_WEIGHT`: Value weight (default 100)
// - `DDNS_RECORD_COUNTRY`: Value country code (default IR)
//
// ### Scheduling & Transport
// - `DDNS_INTERVAL_SECS`: Tick interval, 60..=86400 (default 1800)
// - `DDNS_REQUEST_TIMEOUT_SECS`: Per-call deadline, 1..=120 (default 5)
// - `DDNS_LOCAL_ADDRESS`: Local IP outbound HTTP connections bind to
// - `DDNS_USER_AGENT`: HTTP user agent (default ddnsd/<version>)
//
// ### Misc
// - `DDNS_MODE`: `dry-run` logs updates instead of sending them
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export DDNS_PROVIDER_API_KEY=...
// export DDNS_PROVIDER_DOMAIN_ID=3f2c...
// export DDNS_PROVIDER_BASE_URL=https://napi.arvancloud.ir/cdn/4.0/domains/example.com/dns-records/
// export DDNS_RECORD_NAME=home
// export DDNS_HOSTNAME=home.example.com
//
// ddnsd
// ```

use anyhow::{Context, Result};
use ddns_core::config::{
    DdnsConfig, ProviderConfig, RecordConfig, SchedulerConfig, TargetConfig, TransportConfig,
    default_sources, validate_domain_name,
};
use ddns_core::{PublicIpResolver, Reconciler, Scheduler, SchedulerEvent, SystemDnsLookup};
use ddns_ip_http::HttpIpSource;
use ddns_provider_arvancloud::ArvanCloudProvider;
use std::env;
use std::net::IpAddr;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration, as read from the environment
#[derive(Debug)]
struct Config {
    provider: ProviderConfig,
    record_name: String,
    hostname: String,
    interval_secs: u64,
    request_timeout_secs: u64,
    ttl: u32,
    weight: u32,
    country: String,
    local_address: Option<IpAddr>,
    user_agent: Option<String>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value if set
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let required = |name: &str| {
            var(name).with_context(|| {
                format!("{name} is required. Set it via: export {name}=...")
            })
        };

        let or_default =
            |name: &str, default: &str| var(name).unwrap_or_else(|| default.to_string());

        let dry_run = match var("DDNS_MODE").as_deref() {
            None | Some("live") => false,
            Some("dry-run") => true,
            Some(other) => anyhow::bail!(
                "DDNS_MODE '{}' is not valid. Valid modes: live, dry-run",
                other
            ),
        };

        let provider = ProviderConfig::new(
            required("DDNS_PROVIDER_API_KEY")?,
            required("DDNS_PROVIDER_DOMAIN_ID")?,
            required("DDNS_PROVIDER_BASE_URL")?,
        )
        .with_dry_run(dry_run);

        Ok(Self {
            provider,
            record_name: required("DDNS_RECORD_NAME")?,
            hostname: required("DDNS_HOSTNAME")?,
            interval_secs: parse_number("DDNS_INTERVAL_SECS", var("DDNS_INTERVAL_SECS"), 1800)?,
            request_timeout_secs: parse_number(
                "DDNS_REQUEST_TIMEOUT_SECS",
                var("DDNS_REQUEST_TIMEOUT_SECS"),
                5,
            )?,
            ttl: parse_number("DDNS_RECORD_TTL", var("DDNS_RECORD_TTL"), 120)?,
            weight: parse_number("DDNS_RECORD_WEIGHT", var("DDNS_RECORD_WEIGHT"), 100)?,
            country: or_default("DDNS_RECORD_COUNTRY", "IR"),
            local_address: var("DDNS_LOCAL_ADDRESS")
                .map(|s| {
                    s.trim().parse::<IpAddr>().with_context(|| {
                        format!("DDNS_LOCAL_ADDRESS must be an IP address. Got: {}", s)
                    })
                })
                .transpose()?,
            user_agent: var("DDNS_USER_AGENT"),
            log_level: or_default("DDNS_LOG_LEVEL", "info"),
        })
    }

    /// Validate the configuration
    ///
    /// Checks the values the core types cannot judge on their own:
    /// - Obvious placeholder API keys
    /// - Numeric ranges
    /// - Domain name format
    /// - Log level
    fn validate(&self) -> Result<()> {
        // Check for obvious placeholder keys (common mistake)
        let key_lower = self.provider.api_key.to_lowercase();
        if key_lower.contains("yourarvancloud")
            || key_lower.contains("your_key")
            || key_lower.contains("replace_me")
            || key_lower.starts_with('#')
            || key_lower == "apikey"
        {
            anyhow::bail!(
                "DDNS_PROVIDER_API_KEY appears to be a placeholder. \
                Use an actual API key from the ArvanCloud panel."
            );
        }

        // The header already carries the scheme
        if key_lower.starts_with("apikey ") {
            anyhow::bail!("DDNS_PROVIDER_API_KEY must not include the 'ApiKey ' prefix");
        }

        if !self.provider.base_url.starts_with("https://") {
            if self.provider.base_url.starts_with("http://") {
                eprintln!(
                    "WARNING: DDNS_PROVIDER_BASE_URL uses HTTP (not HTTPS). \
                    The API key will be sent in clear text."
                );
            } else {
                anyhow::bail!(
                    "DDNS_PROVIDER_BASE_URL must use HTTP or HTTPS scheme. Got: {}",
                    self.provider.base_url
                );
            }
        }

        validate_domain_name(&self.hostname)
            .map_err(|e| anyhow::anyhow!("DDNS_HOSTNAME is invalid: {}", e))?;

        // Validate numeric ranges
        if !(60..=86_400).contains(&self.interval_secs) {
            anyhow::bail!(
                "DDNS_INTERVAL_SECS must be between 60 and 86400 seconds. Got: {}",
                self.interval_secs
            );
        }

        if !(1..=120).contains(&self.request_timeout_secs) {
            anyhow::bail!(
                "DDNS_REQUEST_TIMEOUT_SECS must be between 1 and 120 seconds. Got: {}",
                self.request_timeout_secs
            );
        }

        // Validate log level
        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Build the core configuration and run its own validation
    fn to_ddns_config(&self) -> Result<DdnsConfig> {
        let mut transport = TransportConfig {
            request_timeout_secs: self.request_timeout_secs,
            local_address: self.local_address,
            ..TransportConfig::default()
        };
        if let Some(user_agent) = &self.user_agent {
            transport.user_agent = user_agent.clone();
        }

        let config = DdnsConfig {
            sources: default_sources(),
            provider: self.provider.clone(),
            target: TargetConfig::new(&self.record_name, &self.hostname),
            record: RecordConfig {
                ttl: self.ttl,
                weight: self.weight,
                country: self.country.clone(),
                ..RecordConfig::default()
            },
            scheduler: SchedulerConfig {
                interval_secs: self.interval_secs,
                ..SchedulerConfig::default()
            },
            transport,
        };

        config.validate()?;
        Ok(config)
    }
}

/// Parse an optional numeric variable, falling back to `default` when unset
fn parse_number<T>(name: &str, value: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} must be a number. Got: {} ({})", name, raw, e)),
    }
}

/// Initialize tracing with an EnvFilter built from `log_level`
///
/// HTTP client internals are kept at `warn`.
fn init_logging(log_level: &str) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(log_level.to_lowercase())
        .add_directive("hyper=warn".parse()?)
        .add_directive("hyper_util=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_level(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))
}

fn main() -> ExitCode {
    // Variables from a .env file never override the real environment
    let dotenv = dotenvy::dotenv();

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let ddns_config = match config.to_ddns_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration validation error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = init_logging(&config.log_level) {
        eprintln!("{:#}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd daemon");
    match dotenv {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Ignoring unreadable .env file: {}", e),
    }
    info!(
        "Managing record {} ({}) every {}s{}",
        ddns_config.target.record_name,
        ddns_config.target.hostname,
        ddns_config.scheduler.interval_secs,
        if ddns_config.provider.dry_run { " [DRY-RUN]" } else { "" }
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(ddns_config).await {
            error!("Daemon error: {:#}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: DdnsConfig) -> Result<()> {
    let sources = HttpIpSource::from_endpoints(&config.sources, &config.transport)?;
    let resolver = PublicIpResolver::new(sources)?;
    info!("IP sources: {}", resolver.source_names().join(", "));

    let lookup = SystemDnsLookup::new(config.transport.request_timeout());
    let provider = ArvanCloudProvider::new(&config.provider, &config.transport)?;
    debug!("Provider: {:?}", provider);

    let grace = shutdown_grace(&config);

    let reconciler = Reconciler::new(
        resolver,
        Box::new(lookup),
        Box::new(provider),
        config.target,
        config.record,
    );
    let (scheduler, event_rx) = Scheduler::new(reconciler, &config.scheduler)?;
    tokio::spawn(log_events(event_rx));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let run = scheduler.run_with_shutdown(shutdown_rx);
    tokio::pin!(run);

    tokio::select! {
        result = &mut run => {
            result?;
            warn!("Scheduler stopped without a shutdown signal");
        }

        signal = wait_for_shutdown() => {
            let signal = signal?;
            info!("Received shutdown signal: {}", signal);
            let _ = shutdown_tx.send(());

            // Let an in-flight tick finish, within its own call deadlines
            match tokio::time::timeout(grace, &mut run).await {
                Ok(result) => result?,
                Err(_) => anyhow::bail!("Shutdown timeout after {:?}", grace),
            }
            info!("Shutting down daemon");
        }
    }

    Ok(())
}

/// Longest a single tick can take: every source in turn, then the provider
fn shutdown_grace(config: &DdnsConfig) -> Duration {
    let calls = config.sources.len() as u32 + 1;
    config.transport.request_timeout() * calls + Duration::from_secs(1)
}

/// Log scheduler events not already covered by reconciliation logs
async fn log_events(mut event_rx: mpsc::Receiver<SchedulerEvent>) {
    while let Some(event) = event_rx.recv().await {
        match event {
            SchedulerEvent::Started { interval } => debug!("Scheduler running every {:?}", interval),
            SchedulerEvent::TickCompleted {
                tick,
                started_at,
                result,
            } => debug!("Tick {} (started {}) finished: {}", tick, started_at, result),
            SchedulerEvent::TickSkipped { tick } => debug!("Tick {} skipped", tick),
            SchedulerEvent::Stopped { reason } => debug!("Scheduler stopped: {}", reason),
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    // Set up signal handlers for SIGTERM and SIGINT
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_with(extra: &[(&str, &str)]) -> HashMap<String, String> {
        let mut vars: HashMap<String, String> = [
            ("DDNS_PROVIDER_API_KEY", "a1b2c3d4-e5f6-7890-abcd-ef0123456789"),
            ("DDNS_PROVIDER_DOMAIN_ID", "3f2c9a10-record"),
            (
                "DDNS_PROVIDER_BASE_URL",
                "https://napi.arvancloud.ir/cdn/4.0/domains/example.com/dns-records/",
            ),
            ("DDNS_RECORD_NAME", "home"),
            ("DDNS_HOSTNAME", "home.example.com"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        for (k, v) in extra {
            vars.insert(k.to_string(), v.to_string());
        }
        vars
    }

    fn load(vars: &HashMap<String, String>) -> Result<Config> {
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&env_with(&[])).unwrap();
        config.validate().unwrap();

        let ddns = config.to_ddns_config().unwrap();
        assert_eq!(ddns.scheduler.interval_secs, 1800);
        assert_eq!(ddns.transport.request_timeout_secs, 5);
        assert_eq!(ddns.record, RecordConfig::default());
        assert_eq!(ddns.sources.len(), 3);
        assert!(!ddns.provider.dry_run);
        assert_eq!(
            ddns.provider.update_url(),
            "https://napi.arvancloud.ir/cdn/4.0/domains/example.com/dns-records/3f2c9a10-record"
        );
    }

    #[test]
    fn test_missing_required_variable() {
        let mut vars = env_with(&[]);
        vars.remove("DDNS_HOSTNAME");

        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("DDNS_HOSTNAME"), "{}", err);
    }

    #[test]
    fn test_blank_required_variable_counts_as_missing() {
        let err = load(&env_with(&[("DDNS_PROVIDER_API_KEY", "  ")])).unwrap_err();
        assert!(err.to_string().contains("DDNS_PROVIDER_API_KEY"), "{}", err);
    }

    #[test]
    fn test_overrides() {
        let config = load(&env_with(&[
            ("DDNS_INTERVAL_SECS", "600"),
            ("DDNS_REQUEST_TIMEOUT_SECS", "10"),
            ("DDNS_RECORD_TTL", "300"),
            ("DDNS_RECORD_COUNTRY", "DE"),
            ("DDNS_LOCAL_ADDRESS", "192.168.1.20"),
            ("DDNS_USER_AGENT", "home-ddns/1.0"),
            ("DDNS_MODE", "dry-run"),
        ]))
        .unwrap();
        config.validate().unwrap();

        let ddns = config.to_ddns_config().unwrap();
        assert_eq!(ddns.scheduler.interval_secs, 600);
        assert_eq!(ddns.transport.request_timeout_secs, 10);
        assert_eq!(ddns.record.ttl, 300);
        assert_eq!(ddns.record.country, "DE");
        assert_eq!(ddns.transport.local_address, Some("192.168.1.20".parse().unwrap()));
        assert_eq!(ddns.transport.user_agent, "home-ddns/1.0");
        assert!(ddns.provider.dry_run);
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let err = load(&env_with(&[("DDNS_INTERVAL_SECS", "half an hour")])).unwrap_err();
        assert!(err.to_string().contains("DDNS_INTERVAL_SECS"), "{}", err);
    }

    #[test]
    fn test_interval_range() {
        let config = load(&env_with(&[("DDNS_INTERVAL_SECS", "10")])).unwrap();
        assert!(config.validate().is_err());

        let config = load(&env_with(&[("DDNS_INTERVAL_SECS", "86401")])).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_range() {
        let config = load(&env_with(&[("DDNS_REQUEST_TIMEOUT_SECS", "0")])).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_placeholder_key_rejected() {
        let config = load(&env_with(&[("DDNS_PROVIDER_API_KEY", "#YourArvanCloudAPiKey#")])).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("placeholder"), "{}", err);
    }

    #[test]
    fn test_prefixed_key_rejected() {
        let config = load(&env_with(&[("DDNS_PROVIDER_API_KEY", "ApiKey abc123")])).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(load(&env_with(&[("DDNS_MODE", "maybe")])).is_err());
    }

    #[test]
    fn test_invalid_hostname_rejected() {
        let config = load(&env_with(&[("DDNS_HOSTNAME", "home..example.com")])).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let config = load(&env_with(&[("DDNS_LOG_LEVEL", "verbose")])).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_local_address_rejected() {
        assert!(load(&env_with(&[("DDNS_LOCAL_ADDRESS", "eth0")])).is_err());
    }

    #[test]
    fn test_bad_country_fails_core_validation() {
        let config = load(&env_with(&[("DDNS_RECORD_COUNTRY", "iran")])).unwrap();
        config.validate().unwrap();
        assert!(config.to_ddns_config().is_err());
    }

    #[test]
    fn test_api_key_not_in_debug() {
        let config = load(&env_with(&[])).unwrap();
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("a1b2c3d4"));
    }

    #[test]
    fn test_shutdown_grace_covers_worst_case_tick() {
        let config = load(&env_with(&[])).unwrap().to_ddns_config().unwrap();
        // Three sources plus the provider call, 5 s each
        assert_eq!(shutdown_grace(&config), Duration::from_secs(21));
    }
}
