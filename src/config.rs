use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub ranking: RankingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Per-request deadline applied to every service call
    pub request_timeout_secs: u64,
    /// Allowed browser origin; permissive CORS when unset
    pub cors_origin: Option<String>,
    /// Node component of generated record ids (0..1024)
    pub node_id: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    pub default_page_size: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let node_id: u16 = parse_or("NODE_ID", 0);
        if node_id >= 1024 {
            anyhow::bail!("NODE_ID must be less than 1024, got {}", node_id);
        }

        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:data/doctor_rank.db?mode=rwc".to_string()),
                max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 5),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_or("SERVER_PORT", 8000),
                request_timeout_secs: parse_or("REQUEST_TIMEOUT_SECS", 10),
                cors_origin: env::var("CORS_ORIGIN").ok().filter(|o| !o.is_empty()),
                node_id,
            },
            ranking: RankingConfig {
                default_page_size: parse_or("DEFAULT_PAGE_SIZE", 12),
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Directory holding a file-backed database, `None` for in-memory urls
    pub fn database_dir(&self) -> Option<PathBuf> {
        let rest = self.database.url.strip_prefix("sqlite:")?;
        let rest = rest.strip_prefix("//").unwrap_or(rest);
        let path = rest.split('?').next().unwrap_or_default();
        if path.is_empty() || path.contains(":memory:") {
            return None;
        }
        PathBuf::from(path)
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(|dir| dir.to_path_buf())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
                request_timeout_secs: 10,
                cors_origin: None,
                node_id: 0,
            },
            ranking: RankingConfig {
                default_page_size: 12,
            },
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {} value {:?}, using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}
