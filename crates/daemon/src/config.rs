//! Daemon configuration, read once from `INGESTQ_*` environment variables

use anyhow::{bail, Context, Result};
use ingestq_api_http::HttpServerConfig;
use ingestq_core::application::scheduler::constants::DEFAULT_BATCH_API_DELAY;
use ingestq_core::application::SchedulerConfig;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_DB_PATH: &str = "~/.ingestq/status.db";

/// Where status records live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite { db_path: String },
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub http: HttpServerConfig,
    pub store: StoreBackend,
    pub scheduler: SchedulerConfig,
    pub batch_delay: Duration,
    pub batch_timeout: Option<Duration>,
    pub log_format: LogFormat,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let http_defaults = HttpServerConfig::default();
        let scheduler_defaults = SchedulerConfig::default();

        let http = HttpServerConfig {
            host: lookup("INGESTQ_HTTP_HOST").unwrap_or(http_defaults.host),
            port: parse_or(&lookup, "INGESTQ_HTTP_PORT", http_defaults.port)?,
        };

        let store = match lookup("INGESTQ_STORE").as_deref() {
            None | Some("sqlite") => StoreBackend::Sqlite {
                db_path: shellexpand::tilde(
                    &lookup("INGESTQ_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
                )
                .into_owned(),
            },
            Some("memory") => StoreBackend::Memory,
            Some(other) => bail!("INGESTQ_STORE must be 'sqlite' or 'memory', got '{}'", other),
        };

        let scheduler = SchedulerConfig {
            min_dispatch_interval: millis_or(
                &lookup,
                "INGESTQ_DISPATCH_INTERVAL_MS",
                scheduler_defaults.min_dispatch_interval,
            )?,
            idle_poll_interval: millis_or(
                &lookup,
                "INGESTQ_IDLE_POLL_MS",
                scheduler_defaults.idle_poll_interval,
            )?,
            error_backoff: millis_or(
                &lookup,
                "INGESTQ_ERROR_BACKOFF_MS",
                scheduler_defaults.error_backoff,
            )?,
        };
        if scheduler.idle_poll_interval.is_zero() {
            bail!("INGESTQ_IDLE_POLL_MS must be greater than zero");
        }

        let batch_delay = millis_or(&lookup, "INGESTQ_BATCH_DELAY_MS", DEFAULT_BATCH_API_DELAY)?;
        let batch_timeout = lookup("INGESTQ_BATCH_TIMEOUT_MS")
            .map(|raw| parse::<u64>("INGESTQ_BATCH_TIMEOUT_MS", &raw).map(Duration::from_millis))
            .transpose()?;

        let log_format = match lookup("INGESTQ_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            http,
            store,
            scheduler,
            batch_delay,
            batch_timeout,
            log_format,
        })
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{} has invalid value '{}'", key, raw))
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => parse(key, &raw),
        None => Ok(default),
    }
}

fn millis_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Result<Duration> {
    match lookup(key) {
        Some(raw) => parse::<u64>(key, &raw).map(Duration::from_millis),
        None => Ok(default),
    }
}
