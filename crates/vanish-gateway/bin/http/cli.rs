use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::time::Duration;

pub const LISTEN_ADDR_ENV: &str = "VANISH_LISTEN_ADDR";
pub const STORAGE_BACKEND_ENV: &str = "VANISH_STORAGE_BACKEND";
pub const REDIS_URL_ENV: &str = "VANISH_REDIS_URL";
pub const REDIS_KEY_PREFIX_ENV: &str = "VANISH_REDIS_KEY_PREFIX";
pub const REDIS_MAX_RETRIES_ENV: &str = "VANISH_REDIS_MAX_RETRIES";
pub const REDIS_CONNECT_TIMEOUT_MS_ENV: &str = "VANISH_REDIS_CONNECT_TIMEOUT_MS";
pub const REDIS_RESPONSE_TIMEOUT_MS_ENV: &str = "VANISH_REDIS_RESPONSE_TIMEOUT_MS";
pub const PUBLIC_BASE_URL_ENV: &str = "VANISH_PUBLIC_BASE_URL";
pub const HEALTH_TIMEOUT_MS_ENV: &str = "VANISH_HEALTH_TIMEOUT_MS";
pub const TEST_MODE_ENV: &str = "VANISH_TEST_MODE";
pub const LOG_FORMAT_ENV: &str = "VANISH_LOG_FORMAT";

/// Legacy switch for deterministic time, honoured when set to `1`.
pub const LEGACY_TEST_MODE_ENV: &str = "TEST_MODE";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_REDIS_KEY_PREFIX: &str = "paste:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "redis")]
    Redis,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "vanish-gateway", about = "Self-destructing paste store over HTTP")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("storage", "redis"))]
    pub redis_url: Option<String>,

    #[arg(long, env = REDIS_KEY_PREFIX_ENV, default_value = DEFAULT_REDIS_KEY_PREFIX)]
    pub redis_key_prefix: String,

    #[arg(long, env = REDIS_MAX_RETRIES_ENV, default_value_t = 3)]
    pub redis_max_retries: usize,

    #[arg(long, env = REDIS_CONNECT_TIMEOUT_MS_ENV, default_value_t = 2000)]
    pub redis_connect_timeout_ms: u64,

    #[arg(long, env = REDIS_RESPONSE_TIMEOUT_MS_ENV, default_value_t = 2000)]
    pub redis_response_timeout_ms: u64,

    /// Origin for paste URLs, e.g. `https://paste.example.com`. Taken from
    /// the request headers when unset.
    #[arg(long, env = PUBLIC_BASE_URL_ENV)]
    pub public_base_url: Option<String>,

    #[arg(long, env = HEALTH_TIMEOUT_MS_ENV, default_value_t = 2000)]
    pub health_timeout_ms: u64,

    /// Honour the `x-test-now-ms` header. Never enable in production.
    #[arg(
        long,
        env = TEST_MODE_ENV,
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub test_mode: bool,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl CLI {
    pub fn deterministic_time(&self) -> bool {
        self.test_mode || std::env::var(LEGACY_TEST_MODE_ENV).is_ok_and(|value| value == "1")
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    pub fn redis_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.redis_connect_timeout_ms)
    }

    pub fn redis_response_timeout(&self) -> Duration {
        Duration::from_millis(self.redis_response_timeout_ms)
    }
}
