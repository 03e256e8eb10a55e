// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};
use tracing::info;

/// Environment variable that overrides `source.session_cookie`, so the
/// secret can be injected by a scheduler instead of living in the file.
pub const SESSION_COOKIE_ENV: &str = "DATSCRAPER_SESSION_COOKIE";
/// SMTP username; mail is disabled entirely when this is unset.
pub const MAIL_USER_ENV: &str = "DATSCRAPER_MAIL_USER";
/// SMTP password; mail is disabled entirely when this is unset.
pub const MAIL_PASSWORD_ENV: &str = "DATSCRAPER_MAIL_PASSWORD";

/// Full pipeline configuration, built once at startup and passed down.
/// Defaults reproduce the constants the scrape has always used, so an
/// absent or partial config file still yields a working run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub tables: TableSchema,
    pub freshness: FreshnessConfig,
    pub quotes: QuoteConfig,
    pub output: OutputConfig,
    pub mail: MailConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source: SourceConfig::default(),
            tables: TableSchema::default(),
            freshness: FreshnessConfig::default(),
            quotes: QuoteConfig::default(),
            output: OutputConfig::default(),
            mail: MailConfig::default(),
        }
    }
}

impl Config {
    /// Load from a YAML file, falling back to defaults when the file does
    /// not exist. The session cookie env override is applied afterwards in
    /// either case.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.is_file() {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_yaml::from_str(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        } else {
            info!(path = %path.display(), "no config file; using defaults");
            Config::default()
        };

        if let Ok(cookie) = env::var(SESSION_COOKIE_ENV) {
            config.source.session_cookie = cookie;
        }
        Ok(config)
    }
}

/// Where the holdings page lives and how to ask for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub user_agent: String,
    /// Long-lived session cookie. Expires periodically and must be rotated
    /// externally; the freshness validator is what notices when it has.
    pub session_cookie: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            url: "https://bitcointreasuries.net/".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            session_cookie: String::new(),
            timeout_secs: 30,
            max_retries: 3,
            retry_backoff_ms: 1000,
        }
    }
}

/// Positional table/column mapping. The page gives us no ids or classes to
/// hook onto, so extraction is driven by document-order indices; keeping
/// them here means a page restructure is a config edit, not a code edit.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TableSchema {
    pub base: BaseTableMap,
    pub extra: ExtraTableMap,
}

/// Column map for the primary holdings tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseTableMap {
    pub table_indices: Vec<usize>,
    /// Rows with fewer cells than this are skipped.
    pub min_cells: usize,
    pub name_cell: usize,
    pub ticker_cell: usize,
    pub holdings_cell: usize,
    pub max_records: usize,
}

impl Default for BaseTableMap {
    fn default() -> Self {
        BaseTableMap {
            table_indices: vec![0, 1, 2],
            min_cells: 5,
            name_cell: 1,
            ticker_cell: 3,
            holdings_cell: 4,
            max_records: 100,
        }
    }
}

/// Column map for the secondary table whose rows merge positionally onto
/// the base records.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraTableMap {
    pub table_index: usize,
    pub min_cells: usize,
    pub val1_cell: usize,
    pub val2_cell: usize,
    pub max_records: usize,
}

impl Default for ExtraTableMap {
    fn default() -> Self {
        ExtraTableMap {
            table_index: 3,
            min_cells: 7,
            val1_cell: 5,
            val2_cell: 6,
            max_records: 100,
        }
    }
}

/// Stale-session detection. The site renders `?` in the secondary value
/// column when the requester is unauthenticated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshnessConfig {
    pub placeholder: String,
    /// Below this many extra rows the sample is too small to judge.
    pub min_sample: usize,
    pub max_placeholder_ratio: f64,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        FreshnessConfig {
            placeholder: "?".to_string(),
            min_sample: 10,
            max_placeholder_ratio: 0.8,
        }
    }
}

/// Quote provider endpoint and the ticker-candidate heuristic bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Identifiers longer than this are treated as country names, not
    /// tradable symbols.
    pub max_ticker_len: usize,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        QuoteConfig {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            timeout_secs: 10,
            max_ticker_len: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            path: PathBuf::from("data.json"),
        }
    }
}

/// SMTP submission endpoint. Credentials are deliberately not part of the
/// file; they come from the environment and their absence turns the
/// notifier into a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub recipient: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        MailConfig {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            recipient: "stinlove@kakao.com".to_string(),
        }
    }
}
