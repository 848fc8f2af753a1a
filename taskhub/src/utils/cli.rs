use clap::Parser;

use crate::config::{LogLevel, RepoMode};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Deployment environment name (dev/staging/prod)
    #[arg(long, env = "APP_ENV", default_value = "dev")]
    pub app_env: String,

    /// Listening host
    #[arg(long, env = "HTTP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Listening port
    #[arg(short, long, env = "HTTP_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Log level, overridden by RUST_LOG when set
    #[arg(long, env = "LOG_LEVEL", value_enum, ignore_case = true, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    #[arg(long, env = "READ_TIMEOUT_SEC", default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub read_timeout_sec: u64,

    #[arg(long, env = "WRITE_TIMEOUT_SEC", default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub write_timeout_sec: u64,

    #[arg(long, env = "IDLE_TIMEOUT_SEC", default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub idle_timeout_sec: u64,

    /// Upper bound for draining in-flight requests on shutdown
    #[arg(long, env = "SHUTDOWN_TIMEOUT_SEC", default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub shutdown_timeout_sec: u64,

    /// Storage backend
    #[arg(long, env = "REPO_MODE", value_enum, ignore_case = true, default_value_t = RepoMode::Memory)]
    pub repo_mode: RepoMode,

    /// Database connection string, e.g. sqlite://taskhub.db
    #[arg(long, env = "DB_DSN")]
    pub db_dsn: Option<String>,
}
