//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Origins allowed by CORS when `ALLOW_ORIGINS` is unset.
pub const DEFAULT_ALLOW_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "http://localhost:3000",
    "http://127.0.0.1:3000",
];

/// Paths to the AgriReview data directory and database file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// SQLite database file (`data/agrireview.db` unless overridden).
    pub database: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>, database: Option<PathBuf>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            database: database.unwrap_or_else(|| root.join("agrireview.db")),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        if let Some(parent) = self.database.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// CORS policy for the HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode", content = "origins")]
pub enum AllowedOrigins {
    /// Any origin (`ALLOW_ORIGINS=*`).
    Any,
    /// Explicit origin list.
    List(Vec<String>),
}

impl AllowedOrigins {
    /// Parse a comma-separated origin list. Blank entries are dropped; a lone
    /// `*` allows everything. Falls back to the defaults when nothing remains.
    pub fn parse(raw: Option<&str>) -> Self {
        let origins: Vec<String> = raw
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        if origins.iter().any(|o| o == "*") {
            Self::Any
        } else if origins.is_empty() {
            Self::List(DEFAULT_ALLOW_ORIGINS.iter().map(|o| o.to_string()).collect())
        } else {
            Self::List(origins)
        }
    }
}

/// Top-level AgriReview configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bind address for the HTTP server.
    pub host: String,
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// CORS origins.
    pub allow_origins: AllowedOrigins,
}

impl AppConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let database = std::env::var("DATABASE_PATH").ok().map(PathBuf::from);
        let allow_origins = AllowedOrigins::parse(std::env::var("ALLOW_ORIGINS").ok().as_deref());

        let data_paths = DataPaths::new(data_dir, database)?;

        Ok(Self {
            host,
            port,
            data_paths,
            allow_origins,
        })
    }

    /// `host:port` string for binding the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
