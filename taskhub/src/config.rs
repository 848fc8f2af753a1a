use std::fmt;
use std::time::Duration;

use clap::ValueEnum;
use thiserror::Error;

use crate::api::HttpTimeouts;
use crate::utils::cli::Args;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RepoMode {
    Memory,
    Sqlite,
}

impl fmt::Display for RepoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RepoMode::Memory => "memory",
            RepoMode::Sqlite => "sqlite",
        })
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("DB_DSN must be set when REPO_MODE is `{0}`")]
    MissingDsn(RepoMode),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub app_env: String,
    pub host: String,
    pub port: u16,
    pub log_level: LogLevel,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub idle_timeout: Duration,
    pub shutdown_timeout: Duration,
    pub repo_mode: RepoMode,
    pub db_dsn: Option<String>,
}

impl TryFrom<Args> for Config {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let db_dsn = args.db_dsn.filter(|dsn| !dsn.trim().is_empty());
        if args.repo_mode == RepoMode::Sqlite && db_dsn.is_none() {
            return Err(ConfigError::MissingDsn(args.repo_mode));
        }

        Ok(Config {
            app_env: args.app_env,
            host: args.host,
            port: args.port,
            log_level: args.log_level,
            read_timeout: Duration::from_secs(args.read_timeout_sec),
            write_timeout: Duration::from_secs(args.write_timeout_sec),
            idle_timeout: Duration::from_secs(args.idle_timeout_sec),
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout_sec),
            repo_mode: args.repo_mode,
            db_dsn,
        })
    }
}

impl Config {
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn http_timeouts(&self) -> HttpTimeouts {
        HttpTimeouts {
            read: self.read_timeout,
            write: self.write_timeout,
        }
    }
}

/// Loggable summary; the connection string itself never appears.
impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "app_env: {}, addr: {}, level: {}, repo_mode: {}, db_dsn_set: {}, rt: {}s, wt: {}s, it: {}s, st: {}s",
            self.app_env,
            self.socket_addr(),
            self.log_level.as_str(),
            self.repo_mode,
            if self.db_dsn.is_some() { "yes" } else { "no" },
            self.read_timeout.as_secs(),
            self.write_timeout.as_secs(),
            self.idle_timeout.as_secs(),
            self.shutdown_timeout.as_secs(),
        )
    }
}
