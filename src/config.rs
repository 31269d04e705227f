//! Configuration types.
//!
//! Everything comes from `RELAY_*` environment variables. Each section reads
//! through a lookup function so it can be built from a plain map in tests.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::channels::file::FileChannelConfig;
use crate::channels::mail::MailConfig;
use crate::channels::web::WebConfig;
use crate::error::ConfigError;

/// Default capacity of the sourcing and process channels.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Default number of messages the wire-tap may fall behind before dropping.
const DEFAULT_WIRETAP_CAPACITY: usize = 256;

/// Pipeline channel sizing.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Bound of the sourcing and process channels.
    pub channel_capacity: usize,
    /// Bound of the wire-tap broadcast buffer.
    pub wiretap_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            wiretap_capacity: DEFAULT_WIRETAP_CAPACITY,
        }
    }
}

impl PipelineConfig {
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            channel_capacity: positive(lookup, "RELAY_CHANNEL_CAPACITY", DEFAULT_CHANNEL_CAPACITY)?,
            wiretap_capacity: positive(lookup, "RELAY_WIRETAP_CAPACITY", DEFAULT_WIRETAP_CAPACITY)?,
        })
    }
}

/// Logging output.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Directory for a daily-rolling log file, in addition to stderr.
    pub log_dir: Option<PathBuf>,
}

/// Complete relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub file: FileChannelConfig,
    pub web: WebConfig,
    /// `None` when the mail channel is disabled.
    pub mail: Option<MailConfig>,
    pub pipeline: PipelineConfig,
    pub log: LogConfig,
}

impl RelayConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            file: FileChannelConfig::from_lookup(lookup)?,
            web: WebConfig::from_lookup(lookup)?,
            mail: MailConfig::from_lookup(lookup)?,
            pipeline: PipelineConfig::from_lookup(lookup)?,
            log: LogConfig {
                log_dir: lookup("RELAY_LOG_DIR")
                    .filter(|s| !s.trim().is_empty())
                    .map(PathBuf::from),
            },
        })
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Parse `key` if set, otherwise return `default`.
pub(crate) fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{raw:?}: {e}"),
        }),
        None => Ok(default),
    }
}

/// Like [`parse_or`], rejecting zero.
pub(crate) fn positive(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: usize,
) -> Result<usize, ConfigError> {
    match parse_or(lookup, key, default)? {
        0 => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be greater than zero".into(),
        }),
        n => Ok(n),
    }
}

/// A millisecond interval, rejecting zero.
pub(crate) fn interval_ms(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let default_ms = usize::try_from(default.as_millis()).unwrap_or(usize::MAX);
    let ms = positive(lookup, key, default_ms)?;
    Ok(Duration::from_millis(ms as u64))
}
