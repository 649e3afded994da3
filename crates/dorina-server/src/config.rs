//! Configuration management

use serde::{Deserialize, Serialize};
use std::{path::PathBuf, str::FromStr, time::Duration};

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 5000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

// ============================================================================
// Store Configuration Constants
// ============================================================================

/// Default Redis connection URL.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

// ============================================================================
// Cache Configuration Constants
// ============================================================================

/// Lifetime of a cached result list (one day).
pub const DEFAULT_RESULT_TTL_SECS: u64 = 86_400;

/// Lifetime of a session record and its result pointer (one hour).
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3_600;

/// Lifetime of an in-flight marker.
pub const DEFAULT_PENDING_TTL_SECS: u64 = 30;

/// Lifetime of a cached regulator listing.
pub const DEFAULT_REGULATORS_TTL_SECS: u64 = 3_600;

/// Rows per result page.
pub const DEFAULT_MAX_RESULTS: usize = 100;

// ============================================================================
// Path Configuration Constants
// ============================================================================

/// Default root of the genome and regulator data.
pub const DEFAULT_DATA_PATH: &str = "/data/dorina";

/// Default parent of per-session scratch directories.
pub const DEFAULT_SESSION_STORE: &str = "/tmp";

/// Prefix of every per-session scratch directory name.
pub const SESSION_DIR_PREFIX: &str = "dorina-";

// ============================================================================
// Worker Configuration Constants
// ============================================================================

/// Default number of concurrent job executors.
pub const DEFAULT_WORKER_CONCURRENCY: usize = 2;

/// Maximum time a single job may run.
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 600;

/// Idle delay between polls of an empty queue.
pub const DEFAULT_WORKER_POLL_INTERVAL_MS: u64 = 250;

/// Rows appended per store round trip when publishing results.
pub const DEFAULT_RESULT_BATCH_SIZE: usize = 1_000;

/// Interval between sweeps of orphaned session directories.
pub const DEFAULT_JANITOR_INTERVAL_SECS: u64 = 300;

/// Default analysis engine executable.
pub const DEFAULT_ENGINE_COMMAND: &str = "dorina-analyse";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub cache: CacheConfig,
    pub paths: PathConfig,
    pub worker: WorkerConfig,
    pub cors: CorsConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Which key-value backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("Unknown store backend '{}' (expected redis or memory)", other),
        }
    }
}

/// Key-value store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub redis_url: String,
}

/// Cache lifetimes and paging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub result_ttl_secs: u64,
    pub session_ttl_secs: u64,
    pub pending_ttl_secs: u64,
    pub regulators_ttl_secs: u64,
    pub max_results: usize,
}

impl CacheConfig {
    pub fn result_ttl(&self) -> Duration {
        Duration::from_secs(self.result_ttl_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn pending_ttl(&self) -> Duration {
        Duration::from_secs(self.pending_ttl_secs)
    }

    pub fn regulators_ttl(&self) -> Duration {
        Duration::from_secs(self.regulators_ttl_secs)
    }
}

/// Filesystem locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    pub data_path: PathBuf,
    pub session_store: PathBuf,
}

impl PathConfig {
    /// Scratch directory owned by one session
    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.session_store
            .join(format!("{}{}", SESSION_DIR_PREFIX, session_id))
    }
}

/// Background worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub concurrency: usize,
    /// Run workers inside the server process
    pub embedded: bool,
    pub job_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub batch_size: usize,
    pub janitor_interval_secs: u64,
    pub engine_command: String,
}

impl WorkerConfig {
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn janitor_interval(&self) -> Duration {
        Duration::from_secs(self.janitor_interval_secs)
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend = match std::env::var("STORE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StoreBackend::Redis,
        };

        let config = Config {
            server: ServerConfig {
                host: env_string("DORINA_HOST", DEFAULT_SERVER_HOST),
                port: env_or("DORINA_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_or(
                    "DORINA_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            store: StoreConfig {
                backend,
                redis_url: env_string("REDIS_URL", DEFAULT_REDIS_URL),
            },
            cache: CacheConfig {
                result_ttl_secs: env_or("RESULT_TTL", DEFAULT_RESULT_TTL_SECS),
                session_ttl_secs: env_or("SESSION_TTL", DEFAULT_SESSION_TTL_SECS),
                pending_ttl_secs: env_or("PENDING_TTL", DEFAULT_PENDING_TTL_SECS),
                regulators_ttl_secs: env_or("REGULATORS_TTL", DEFAULT_REGULATORS_TTL_SECS),
                max_results: env_or("MAX_RESULTS", DEFAULT_MAX_RESULTS),
            },
            paths: PathConfig {
                data_path: PathBuf::from(env_string("DATA_PATH", DEFAULT_DATA_PATH)),
                session_store: PathBuf::from(env_string("SESSION_STORE", DEFAULT_SESSION_STORE)),
            },
            worker: WorkerConfig {
                concurrency: env_or("WORKER_CONCURRENCY", DEFAULT_WORKER_CONCURRENCY),
                embedded: env_or("WORKER_EMBEDDED", true),
                job_timeout_secs: env_or("JOB_TIMEOUT", DEFAULT_JOB_TIMEOUT_SECS),
                poll_interval_ms: env_or("WORKER_POLL_INTERVAL_MS", DEFAULT_WORKER_POLL_INTERVAL_MS),
                batch_size: env_or("RESULT_BATCH_SIZE", DEFAULT_RESULT_BATCH_SIZE),
                janitor_interval_secs: env_or("JANITOR_INTERVAL", DEFAULT_JANITOR_INTERVAL_SECS),
                engine_command: env_string("DORINA_ENGINE_CMD", DEFAULT_ENGINE_COMMAND),
            },
            cors: CorsConfig {
                allowed_origins: env_string("CORS_ALLOWED_ORIGINS", DEFAULT_CORS_ALLOWED_ORIGIN)
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", true),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.store.backend == StoreBackend::Redis && self.store.redis_url.is_empty() {
            anyhow::bail!("REDIS_URL cannot be empty when the redis backend is selected");
        }

        for (name, secs) in [
            ("RESULT_TTL", self.cache.result_ttl_secs),
            ("SESSION_TTL", self.cache.session_ttl_secs),
            ("PENDING_TTL", self.cache.pending_ttl_secs),
            ("REGULATORS_TTL", self.cache.regulators_ttl_secs),
            ("JOB_TIMEOUT", self.worker.job_timeout_secs),
        ] {
            if secs == 0 {
                anyhow::bail!("{} must be greater than 0", name);
            }
        }

        if self.cache.max_results == 0 {
            anyhow::bail!("MAX_RESULTS must be greater than 0");
        }

        if self.worker.concurrency == 0 {
            anyhow::bail!("WORKER_CONCURRENCY must be greater than 0");
        }

        if self.worker.batch_size == 0 {
            anyhow::bail!("RESULT_BATCH_SIZE must be greater than 0");
        }

        if self.worker.engine_command.trim().is_empty() {
            anyhow::bail!("DORINA_ENGINE_CMD cannot be empty");
        }

        if self.store.backend == StoreBackend::Memory && !self.worker.embedded {
            tracing::warn!(
                "Memory store without embedded workers: queued jobs will never be picked up"
            );
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            store: StoreConfig {
                backend: StoreBackend::Redis,
                redis_url: DEFAULT_REDIS_URL.to_string(),
            },
            cache: CacheConfig {
                result_ttl_secs: DEFAULT_RESULT_TTL_SECS,
                session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
                pending_ttl_secs: DEFAULT_PENDING_TTL_SECS,
                regulators_ttl_secs: DEFAULT_REGULATORS_TTL_SECS,
                max_results: DEFAULT_MAX_RESULTS,
            },
            paths: PathConfig {
                data_path: PathBuf::from(DEFAULT_DATA_PATH),
                session_store: PathBuf::from(DEFAULT_SESSION_STORE),
            },
            worker: WorkerConfig {
                concurrency: DEFAULT_WORKER_CONCURRENCY,
                embedded: true,
                job_timeout_secs: DEFAULT_JOB_TIMEOUT_SECS,
                poll_interval_ms: DEFAULT_WORKER_POLL_INTERVAL_MS,
                batch_size: DEFAULT_RESULT_BATCH_SIZE,
                janitor_interval_secs: DEFAULT_JANITOR_INTERVAL_SECS,
                engine_command: DEFAULT_ENGINE_COMMAND.to_string(),
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.result_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.cache.pending_ttl(), Duration::from_secs(30));
        assert_eq!(config.cache.max_results, 100);
        assert_eq!(config.worker.batch_size, 1_000);
    }

    #[test]
    fn test_zero_ttl_is_rejected() {
        let mut config = Config::default();
        config.cache.pending_ttl_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("PENDING_TTL"));
    }

    #[test]
    fn test_zero_port_is_rejected() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_store_backend_from_str() {
        assert_eq!("redis".parse::<StoreBackend>().unwrap(), StoreBackend::Redis);
        assert_eq!("MEMORY".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_session_dir() {
        let paths = PathConfig {
            data_path: PathBuf::from("/data"),
            session_store: PathBuf::from("/scratch"),
        };
        assert_eq!(
            paths.session_dir("abc"),
            PathBuf::from("/scratch/dorina-abc")
        );
    }
}
