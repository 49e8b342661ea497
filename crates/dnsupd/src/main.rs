// # dnsupd - dnsup Daemon
//
// This is a thin integration layer: it reads configuration, wires the HTTP
// resolver and the Sitelutions updater into a `Scheduler`, and forwards the
// event log to tracing. All update logic lives in dnsup-core.
//
// ## Configuration
//
// All configuration is done via environment variables. Any of the record
// fields left unset are taken from the settings file.
//
// ### Record
// - `DNSUP_RECORD_ID`: Sitelutions record ID
// - `DNSUP_ACCOUNT`: Account email
// - `DNSUP_SECRET`: API key
// - `DNSUP_INTERVAL`: One of `60 minutes`, `4 hours`, `6 hours`, `24 hours`
//
// ### Runtime
// - `DNSUP_MODE`: `daemon` (default) or `once`
// - `DNSUP_SETTINGS_PATH`: Settings file (default `settings.json`)
// - `DNSUP_IP_URL`: Public IP endpoint
// - `DNSUP_UPDATE_URL`: DNS update endpoint
// - `DNSUP_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export DNSUP_RECORD_ID=123456
// export DNSUP_ACCOUNT=me@example.org
// export DNSUP_SECRET=...
// export DNSUP_INTERVAL="4 hours"
//
// dnsupd
// ```

use anyhow::Result;
use dnsup_core::config::{DEFAULT_IP_URL, DEFAULT_UPDATE_URL};
use dnsup_core::{
    ChannelSink, Credentials, DnsupConfig, EventSink, FileSettingsStore, Interval, LogEntry,
    RunOutcome, Scheduler, Settings, SettingsStore, UpdateOperation,
};
use dnsup_ip_http::HttpIpResolver;
use dnsup_provider_sitelutions::SitelutionsUpdater;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// How long shutdown waits for an in-flight update
const DRAIN_TIMEOUT: Duration = Duration::from_secs(25);

/// Default settings file, relative to the working directory
const DEFAULT_SETTINGS_PATH: &str = "settings.json";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DnsupExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error, or a failed update in `once` mode
    RuntimeError = 2,
}

impl From<DnsupExitCode> for ExitCode {
    fn from(code: DnsupExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// What the daemon does after startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Run automatic updates until a shutdown signal arrives
    Daemon,
    /// Run a single update and exit
    Once,
}

/// Application configuration
#[derive(Clone)]
struct Config {
    record_id: Option<String>,
    account: Option<String>,
    secret: Option<String>,
    interval: Option<String>,
    settings_path: String,
    mode: String,
    ip_url: String,
    update_url: String,
    log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            record_id: None,
            account: None,
            secret: None,
            interval: None,
            settings_path: DEFAULT_SETTINGS_PATH.to_string(),
            mode: "daemon".to_string(),
            ip_url: DEFAULT_IP_URL.to_string(),
            update_url: DEFAULT_UPDATE_URL.to_string(),
            log_level: "info".to_string(),
        }
    }
}

// Custom Debug implementation that hides the secret
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("record_id", &self.record_id)
            .field("account", &self.account)
            .field("secret", &self.secret.as_ref().map(|_| "<REDACTED>"))
            .field("interval", &self.interval)
            .field("settings_path", &self.settings_path)
            .field("mode", &self.mode)
            .field("ip_url", &self.ip_url)
            .field("update_url", &self.update_url)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            record_id: var("DNSUP_RECORD_ID")?,
            account: var("DNSUP_ACCOUNT")?,
            secret: var("DNSUP_SECRET")?,
            interval: var("DNSUP_INTERVAL")?,
            settings_path: var("DNSUP_SETTINGS_PATH")?.unwrap_or(defaults.settings_path),
            mode: var("DNSUP_MODE")?.unwrap_or(defaults.mode),
            ip_url: var("DNSUP_IP_URL")?.unwrap_or(defaults.ip_url),
            update_url: var("DNSUP_UPDATE_URL")?.unwrap_or(defaults.update_url),
            log_level: var("DNSUP_LOG_LEVEL")?.unwrap_or(defaults.log_level),
        })
    }

    /// Fill fields the environment left unset from saved settings
    ///
    /// Empty saved values never overwrite anything.
    fn merge_settings(&mut self, settings: &Settings) {
        fn fill(slot: &mut Option<String>, saved: &str) {
            if slot.is_none() && !saved.is_empty() {
                *slot = Some(saved.to_string());
            }
        }

        fill(&mut self.record_id, &settings.record_id);
        fill(&mut self.account, &settings.email);
        fill(&mut self.secret, &settings.api_key);

        // An unrecognized saved label counts as no interval
        if self.interval.is_none() {
            self.interval = settings.interval().map(String::from);
        }
    }

    /// Credentials as configured; missing fields are empty
    fn credentials(&self) -> Credentials {
        Credentials::new(
            self.record_id.clone().unwrap_or_default(),
            self.account.clone().unwrap_or_default(),
            self.secret.clone().unwrap_or_default(),
        )
    }

    fn mode(&self) -> Result<Mode> {
        match self.mode.to_lowercase().as_str() {
            "daemon" => Ok(Mode::Daemon),
            "once" => Ok(Mode::Once),
            _ => anyhow::bail!(
                "DNSUP_MODE '{}' is not valid. Valid modes: daemon, once",
                self.mode
            ),
        }
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DNSUP_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Parsed update interval
    fn interval(&self) -> Result<Interval> {
        let Some(label) = self.interval.as_deref() else {
            anyhow::bail!(
                "DNSUP_INTERVAL is required in daemon mode. \
                Set it via: export DNSUP_INTERVAL=\"4 hours\""
            );
        };

        label.parse::<Interval>().map_err(|e| {
            let valid: Vec<&str> = Interval::ALL.iter().map(|i| i.label()).collect();
            anyhow::anyhow!("{}. Valid intervals: {}", e, valid.join(", "))
        })
    }

    /// Core engine configuration derived from this configuration
    fn core_config(&self) -> DnsupConfig {
        let mut config = DnsupConfig::new();
        config.resolver.url = self.ip_url.clone();
        config.updater.url = self.update_url.clone();
        config
    }

    /// Validate the configuration
    ///
    /// Incomplete credentials are not rejected here: the update operation
    /// reports them on every cycle.
    fn validate(&self) -> Result<()> {
        let mode = self.mode()?;
        self.log_level()?;

        if mode == Mode::Daemon {
            self.interval()?;
        }

        if self.settings_path.is_empty() {
            anyhow::bail!("DNSUP_SETTINGS_PATH cannot be empty");
        }

        validate_url("DNSUP_IP_URL", &self.ip_url)?;
        validate_url("DNSUP_UPDATE_URL", &self.update_url)?;

        // Check for obvious placeholder secrets (common mistake)
        if let Some(secret) = &self.secret {
            let secret_lower = secret.to_lowercase();
            if secret_lower.contains("your_api_key")
                || secret_lower.contains("your_key")
                || secret_lower.contains("replace_me")
                || secret_lower == "changeme"
                || secret_lower == "secret"
            {
                anyhow::bail!(
                    "DNSUP_SECRET appears to be a placeholder. \
                    Use the API key from your Sitelutions account."
                );
            }
        }

        self.core_config().validate()?;

        Ok(())
    }
}

/// Read one environment variable; unset and blank both mean `None`
fn var(name: &str) -> Result<Option<String>> {
    match env::var(name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(anyhow::anyhow!("{}: {}", name, e)),
    }
}

fn validate_url(name: &str, url: &str) -> Result<()> {
    if !url.starts_with("https://") && !url.starts_with("http://") {
        anyhow::bail!("{} must use HTTP or HTTPS scheme. Got: {}", name, url);
    }

    if url.starts_with("http://") {
        eprintln!(
            "WARNING: {} uses HTTP (not HTTPS). \
            The API key is sent in the query string.",
            name
        );
    }

    Ok(())
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DnsupExitCode::ConfigError.into();
        }
    };

    // Initialize tracing
    let log_level = match config.log_level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return DnsupExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DnsupExitCode::ConfigError.into();
    }

    info!("Starting dnsupd");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DnsupExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(config)).into()
}

/// Load settings, wire the components and run the selected mode
async fn run(mut config: Config) -> DnsupExitCode {
    let store = match FileSettingsStore::new(&config.settings_path).await {
        Ok(store) => store,
        Err(e) => {
            error!("Settings store error: {}", e);
            return DnsupExitCode::ConfigError;
        }
    };

    let (saved, load_report) = load_settings(&store).await;
    if let Some(settings) = &saved {
        config.merge_settings(settings);
    }

    if let Err(e) = config.validate() {
        error!("Configuration validation error: {}", e);
        return DnsupExitCode::ConfigError;
    }
    let mode = match config.mode() {
        Ok(mode) => mode,
        Err(e) => {
            error!("Configuration validation error: {}", e);
            return DnsupExitCode::ConfigError;
        }
    };

    let credentials = config.credentials();
    if !credentials.is_complete() {
        warn!("Record ID, account or secret is missing; updates will fail until it is set");
    }
    debug!("Effective configuration: {:?}", config);

    let core = config.core_config();
    let (sink, events) = ChannelSink::with_stream(core.events.channel_capacity);
    let printer = tokio::spawn(print_events(events));

    if let Some(line) = load_report {
        sink.log(line);
    }

    info!("IP endpoint: {}", core.resolver.url);
    info!("Update endpoint: {}", core.updater.url);

    let scheduler = Scheduler::new(UpdateOperation::new(
        Arc::new(HttpIpResolver::from_config(&core.resolver)),
        Arc::new(SitelutionsUpdater::from_config(&core.updater)),
        Arc::new(sink.clone()),
    ));

    let code = match mode {
        Mode::Once => run_once(&scheduler, credentials).await,
        Mode::Daemon => match run_daemon(&scheduler, &store, &sink, &config).await {
            Ok(()) => DnsupExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {}", e);
                DnsupExitCode::RuntimeError
            }
        },
    };

    // Closing the last senders ends the event stream
    drop(scheduler);
    drop(sink);
    if tokio::time::timeout(Duration::from_secs(1), printer).await.is_err() {
        debug!("Event printer still running at exit");
    }

    code
}

/// Load saved settings and the event line describing the outcome
///
/// A missing file yields no line; a load failure is reported and treated
/// as no saved settings.
async fn load_settings(store: &dyn SettingsStore) -> (Option<Settings>, Option<String>) {
    match store.load().await {
        Ok(Some(settings)) => (
            Some(settings),
            Some("Settings loaded successfully.".to_string()),
        ),
        Ok(None) => (None, None),
        Err(e) => {
            warn!("Could not load settings file: {}", e);
            (None, Some(format!("Could not load settings file. {}", e)))
        }
    }
}

/// Run a single update
async fn run_once(scheduler: &Scheduler, credentials: Credentials) -> DnsupExitCode {
    match scheduler.run_once(credentials).await {
        Ok(RunOutcome::Completed(result)) if result.is_success() => DnsupExitCode::CleanShutdown,
        Ok(RunOutcome::Completed(_)) | Ok(RunOutcome::Skipped) => DnsupExitCode::RuntimeError,
        Err(e) => {
            error!("Update worker error: {}", e);
            DnsupExitCode::RuntimeError
        }
    }
}

/// Run automatic updates until a shutdown signal arrives
async fn run_daemon(
    scheduler: &Scheduler,
    store: &FileSettingsStore,
    sink: &ChannelSink,
    config: &Config,
) -> Result<()> {
    let credentials = config.credentials();
    let interval = config.interval()?;

    match store.save(&Settings::new(&credentials, Some(interval))).await {
        Ok(()) => sink.log("Settings saved.".to_string()),
        Err(e) => {
            warn!("Failed to save settings to {}: {}", store.path().display(), e);
            sink.log(format!("Could not save settings. {}", e));
        }
    }

    scheduler.start(credentials, interval)?;
    info!("Daemon initialized successfully");

    let signal = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", signal);

    scheduler.stop();

    if scheduler.is_in_flight() {
        info!("Waiting up to {:?} for the in-flight update", DRAIN_TIMEOUT);
    }
    if tokio::time::timeout(DRAIN_TIMEOUT, scheduler.drain())
        .await
        .is_err()
    {
        anyhow::bail!("In-flight update did not finish within {:?}", DRAIN_TIMEOUT);
    }

    info!("Shutting down daemon");
    Ok(())
}

/// Forward event log lines to tracing until every sink is dropped
async fn print_events(mut events: ReceiverStream<LogEntry>) {
    while let Some(entry) = events.next().await {
        info!(target: "dnsup::events", "{}", entry);
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(name)
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
