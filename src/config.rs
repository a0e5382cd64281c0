//! Configuration for the render cache.
//!
//! Every option is a clap flag with an environment-variable fallback under
//! the `RENDERCACHE_` prefix, so the binary runs the same way from a shell,
//! a systemd unit, or a container entrypoint. The only required option is
//! the storage path; everything else has a usable default.
//!
//! # Example
//!
//! ```ignore
//! use rendercache::config::Config;
//!
//! let config = Config::parse();
//!
//! println!("Listening on {}:{}", config.host, config.port);
//! println!("Cache root: {}", config.storage_path.display());
//! ```
//!
//! # Environment Variables
//!
//! - `RENDERCACHE_HOST` - Server bind address (default: 0.0.0.0)
//! - `RENDERCACHE_PORT` - Server port (default: 3000)
//! - `RENDERCACHE_STORAGE_PATH` - Cache entry directory (required)
//! - `RENDERCACHE_FETCH_TIMEOUT` - Upstream fetch timeout in seconds (default: 10)
//! - `RENDERCACHE_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 86400)
//! - `RENDERCACHE_CORS_ORIGINS` - Allowed CORS origins (comma-separated)

use std::path::PathBuf;

use clap::Parser;

// =============================================================================
// Default Values
// =============================================================================

/// Bind address used when none is given.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Port used when none is given.
pub const DEFAULT_PORT: u16 = 3000;

/// Default upstream fetch timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT: u64 = 10;

/// Default HTTP cache max-age in seconds (1 day).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 86400;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Render Cache - an on-demand image rescaling server.
///
/// Fetches source images over HTTP, rescales them to a requested width or
/// height, and persists each rendered result on the filesystem so repeated
/// requests are served without touching the upstream again.
#[derive(Parser, Debug, Clone)]
#[command(name = "rendercache")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Address the server binds to.
    #[arg(long, default_value = DEFAULT_HOST, env = "RENDERCACHE_HOST")]
    pub host: String,

    /// TCP port the server listens on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "RENDERCACHE_PORT")]
    pub port: u16,

    // =========================================================================
    // Storage Configuration
    // =========================================================================
    /// Directory where rendered cache entries are stored.
    ///
    /// Created on startup if it does not exist.
    #[arg(long, env = "RENDERCACHE_STORAGE_PATH")]
    pub storage_path: PathBuf,

    // =========================================================================
    // Upstream Configuration
    // =========================================================================
    /// Timeout for fetching a source image, in seconds.
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT, env = "RENDERCACHE_FETCH_TIMEOUT")]
    pub fetch_timeout: u64,

    // =========================================================================
    // HTTP Configuration
    // =========================================================================
    /// max-age sent in the Cache-Control response header, in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "RENDERCACHE_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Origins allowed by CORS, comma-separated.
    ///
    /// Any origin is allowed when unset.
    #[arg(long, env = "RENDERCACHE_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Log at debug level.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Turn off per-request tracing spans.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Check the configuration for values the server cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.storage_path.as_os_str().is_empty() {
            return Err(
                "Storage path is required. Set --storage-path or RENDERCACHE_STORAGE_PATH"
                    .to_string(),
            );
        }

        if self.fetch_timeout == 0 {
            return Err("fetch_timeout must be greater than 0".to_string());
        }

        Ok(())
    }

    /// The "host:port" string the listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Tests
// =============================================================================
