//! Configuration management

use crate::storage::StorageConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL, a file next to the working directory.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://uploads.db";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:4200";

/// Default directory for uploaded CSVs and their JSON artifacts.
pub const DEFAULT_UPLOAD_DIRECTORY: &str = "./uploads";

/// Default upload size limit in megabytes.
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 200;

/// Default job age, in days, after which the retention sweep deletes a job.
pub const DEFAULT_JOB_CLEANUP_DAYS: i64 = 3;

/// Default interval between retention sweeps (daily).
pub const DEFAULT_JOB_CLEANUP_INTERVAL_SECS: u64 = 86_400;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub storage: StorageConfig,
    pub retention: RetentionConfig,
    pub security: SecurityConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Job retention sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Jobs created more than this many days ago are swept
    pub cleanup_days: i64,
    pub interval_secs: u64,
}

/// Secrets
#[derive(Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Key mixed into obfuscated external ids
    pub secret_key: String,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment and defaults
    ///
    /// `SECRET_KEY` has no default; loading fails when it is unset or empty.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let secret_key = std::env::var("SECRET_KEY")
            .map_err(|_| anyhow::anyhow!("SECRET_KEY must be set"))?;

        let config = Config {
            server: ServerConfig {
                host: std::env::var("CSVJOB_HOST")
                    .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: env_or("CSVJOB_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_or(
                    "CSVJOB_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", true),
            },
            storage: StorageConfig {
                upload_dir: std::env::var("UPLOAD_DIRECTORY")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_UPLOAD_DIRECTORY)),
                max_file_size_mb: env_or("MAX_FILE_SIZE_MB", DEFAULT_MAX_FILE_SIZE_MB),
            },
            retention: RetentionConfig {
                cleanup_days: env_or("JOB_CLEANUP_DAYS", DEFAULT_JOB_CLEANUP_DAYS),
                interval_secs: env_or(
                    "JOB_CLEANUP_INTERVAL_SECS",
                    DEFAULT_JOB_CLEANUP_INTERVAL_SECS,
                ),
            },
            security: SecurityConfig { secret_key },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.storage.max_file_size_mb == 0 {
            anyhow::bail!("MAX_FILE_SIZE_MB must be greater than 0");
        }

        if self.retention.cleanup_days < 0 {
            anyhow::bail!("JOB_CLEANUP_DAYS cannot be negative");
        }

        if self.retention.interval_secs == 0 {
            anyhow::bail!("JOB_CLEANUP_INTERVAL_SECS must be greater than 0");
        }

        if self.security.secret_key.trim().is_empty() {
            anyhow::bail!("SECRET_KEY cannot be empty");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    /// Defaults for local development and tests; `secret_key` is a placeholder
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
            storage: StorageConfig::default(),
            retention: RetentionConfig {
                cleanup_days: DEFAULT_JOB_CLEANUP_DAYS,
                interval_secs: DEFAULT_JOB_CLEANUP_INTERVAL_SECS,
            },
            security: SecurityConfig {
                secret_key: "development-secret".to_string(),
            },
        }
    }
}
