//! Configuration for the resource API
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Resource catalog and download analytics API
#[derive(Parser, Debug, Clone)]
#[command(name = "trustml-backend")]
#[command(about = "Resource catalog and download analytics API")]
#[command(version)]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8001")]
    pub listen: SocketAddr,

    /// Document store configuration
    #[command(flatten)]
    pub store: StoreArgs,

    /// Directory holding the downloadable resource files
    /// (Resource.file_path is resolved relative to this)
    #[arg(long, env = "RESOURCE_ROOT", default_value = "public/resources")]
    pub resource_root: PathBuf,

    /// Allowed CORS origins: "*" or a comma-separated list
    #[arg(long, env = "CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Maximum accepted request body size in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "1048576")]
    pub max_body_bytes: usize,

    /// Logging configuration
    #[command(flatten)]
    pub log: LogArgs,

    /// Development mode: fall back to the in-memory store when MongoDB is unreachable
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,
}

/// MongoDB connection configuration
#[derive(Parser, Debug, Clone)]
pub struct StoreArgs {
    /// MongoDB connection string (takes precedence over MONGODB_URI)
    #[arg(long, env = "MONGO_URL")]
    pub mongo_url: Option<String>,

    /// MongoDB connection string (alternate variable name)
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "DB_NAME", default_value = "trustml_db")]
    pub db_name: String,

    /// Deadline for a single store call in milliseconds
    #[arg(long, env = "STORE_TIMEOUT_MS", default_value = "5000")]
    pub store_timeout_ms: u64,
}

/// Logging configuration
#[derive(Parser, Debug, Clone)]
pub struct LogArgs {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl StoreArgs {
    /// Effective connection string (MONGO_URL wins over MONGODB_URI)
    pub fn connection_uri(&self) -> &str {
        self.mongo_url
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.mongodb_uri)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

impl Args {
    /// Parsed CORS allow-list; `None` means any origin
    pub fn cors_allow_list(&self) -> Option<Vec<String>> {
        let raw = self.cors_origins.trim();
        if raw == "*" || raw.is_empty() {
            return None;
        }
        Some(
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.store.store_timeout_ms == 0 {
            return Err("STORE_TIMEOUT_MS must be greater than zero".to_string());
        }

        if self.max_body_bytes == 0 {
            return Err("MAX_BODY_BYTES must be greater than zero".to_string());
        }

        let uri = self.store.connection_uri();
        if !uri.starts_with("mongodb://") && !uri.starts_with("mongodb+srv://") {
            return Err(format!("Invalid MongoDB connection string: {}", uri));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["trustml-backend", "--mongodb-uri", "mongodb://db:27017"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_mongo_url_takes_precedence() {
        let args = parse(&["--mongo-url", "mongodb://primary:27017"]);
        assert_eq!(args.store.connection_uri(), "mongodb://primary:27017");

        let args = parse(&["--mongo-url", "  "]);
        assert_eq!(args.store.connection_uri(), "mongodb://db:27017");
    }

    #[test]
    fn test_cors_allow_list() {
        let args = parse(&["--cors-origins", "*"]);
        assert!(args.cors_allow_list().is_none());

        let args = parse(&["--cors-origins", "https://a.example, https://b.example,"]);
        assert_eq!(
            args.cors_allow_list().unwrap(),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn test_validate() {
        assert!(parse(&[]).validate().is_ok());
        assert!(parse(&["--store-timeout-ms", "0"]).validate().is_err());
        assert!(parse(&["--mongo-url", "postgres://nope"]).validate().is_err());
    }
}
