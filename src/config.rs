//! Configuration types for rss-dl

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Ledger persistence configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Path to the SQLite ledger database (default: "./rss-dl.db")
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            ledger_path: default_ledger_path(),
        }
    }
}

/// Duplicate detection configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Ordered list of root directories scanned for already-existing content
    ///
    /// An empty list disables duplicate checking for the whole run. That is
    /// allowed but surfaced as a startup warning, never silently.
    #[serde(default)]
    pub search_dirs: Vec<PathBuf>,
}

/// Download behavior configuration (target directory, fetch timeout)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory newly fetched torrent files are written into
    ///
    /// There is no usable default; leaving this unset is a fatal
    /// configuration error at construction time.
    #[serde(default)]
    pub target_dir: Option<PathBuf>,

    /// Timeout applied by the bundled HTTP fetcher (default: 30 seconds)
    #[serde(default = "default_fetch_timeout", with = "duration_serde")]
    pub fetch_timeout: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            target_dir: None,
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

/// Webhook endpoint for run report delivery
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL (receives a JSON POST with the report body)
    pub url: String,

    /// Display name used as the report sender
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
}

/// Notification configuration (report delivery endpoints)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Webhook configurations; an empty list means no report is sent
    #[serde(default)]
    pub webhooks: Vec<WebhookConfig>,
}

/// Main configuration for [`RssDownloader`](crate::RssDownloader)
///
/// Fields are organized into logical sub-configs:
/// - [`persistence`](PersistenceConfig) — ledger database location
/// - [`dedup`](DedupConfig) — duplicate-check search directories
/// - [`download`](DownloadConfig) — target directory, fetch timeout
/// - [`notifications`](NotificationConfig) — report delivery
///
/// Configuration is an explicit value passed into the downloader
/// constructor; there is no process-global state. Callers that combine
/// command-line overrides with a configuration file should use
/// [`Config::resolve`] once at startup.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Ledger persistence settings
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Duplicate detection settings
    #[serde(default)]
    pub dedup: DedupConfig,

    /// Download behavior settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Notification settings
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Explicit per-field overrides for [`Config::resolve`]
///
/// Every field is optional; `None` means "fall through to the file-based
/// default, then to the hardcoded default".
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Overrides `persistence.ledger_path`
    pub ledger_path: Option<PathBuf>,
    /// Overrides `dedup.search_dirs`
    pub search_dirs: Option<Vec<PathBuf>>,
    /// Overrides `download.target_dir`
    pub target_dir: Option<PathBuf>,
    /// Overrides `download.fetch_timeout`
    pub fetch_timeout: Option<Duration>,
}

impl Config {
    /// Load file-based defaults from a JSON configuration file
    ///
    /// Every field is optional in the file; missing fields fall back to
    /// their hardcoded defaults. The result is typically passed to
    /// [`Config::resolve`] as the `file_defaults` argument.
    pub async fn load(path: &Path) -> Result<Config> {
        let contents = tokio::fs::read(path).await?;
        let config = serde_json::from_slice(&contents)?;
        Ok(config)
    }

    /// Merge explicit overrides, file-based defaults, and hardcoded defaults
    ///
    /// Precedence is explicit > file > hardcoded, evaluated field by field.
    /// This is a pure function meant to run exactly once at startup; the
    /// resulting [`Config`] is the only configuration state the engine sees.
    pub fn resolve(explicit: ConfigOverrides, file_defaults: Option<Config>) -> Config {
        let base = file_defaults.unwrap_or_default();

        Config {
            persistence: PersistenceConfig {
                ledger_path: explicit
                    .ledger_path
                    .unwrap_or(base.persistence.ledger_path),
            },
            dedup: DedupConfig {
                search_dirs: explicit.search_dirs.unwrap_or(base.dedup.search_dirs),
            },
            download: DownloadConfig {
                target_dir: explicit.target_dir.or(base.download.target_dir),
                fetch_timeout: explicit
                    .fetch_timeout
                    .unwrap_or(base.download.fetch_timeout),
            },
            notifications: base.notifications,
        }
    }
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("rss-dl.db")
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_sender_name() -> String {
    "rss-dl".to_string()
}

// Duration serialization helper (seconds as u64)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
