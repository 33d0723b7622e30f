//! Server configuration, read from flags with environment fallbacks.

use crate::analyzer::DEFAULT_ANALYSIS_TIMEOUT_MS;
use crate::{EngineConfig, Error, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// pagestyle: extract fonts and dominant colors from web pages
#[derive(Debug, Clone, Parser)]
#[command(name = "pagestyle", version, about)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "LISTEN_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Chrome/Chromium executable; discovered automatically when unset
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Disable the Chrome sandbox (needed in some containers)
    #[arg(long, env = "CHROME_NO_SANDBOX")]
    pub no_sandbox: bool,

    /// Upper bound on page navigation, in milliseconds
    #[arg(long, env = "NAVIGATION_TIMEOUT_MS", default_value_t = 30000)]
    pub navigation_timeout_ms: u64,

    /// Upper bound on a whole analysis, in milliseconds
    #[arg(long, env = "ANALYSIS_TIMEOUT_MS", default_value_t = DEFAULT_ANALYSIS_TIMEOUT_MS)]
    pub analysis_timeout_ms: u64,

    /// Extra wait after the network settles, in milliseconds
    #[arg(long, env = "SETTLE_MS", default_value_t = 0)]
    pub settle_ms: u64,

    /// User agent override
    #[arg(long, env = "USER_AGENT")]
    pub user_agent: Option<String>,

    /// Directory served for any path other than the API
    #[arg(long, env = "STATIC_DIR")]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            chrome_path: None,
            no_sandbox: false,
            navigation_timeout_ms: 30000,
            analysis_timeout_ms: DEFAULT_ANALYSIS_TIMEOUT_MS,
            settle_ms: 0,
            user_agent: None,
            static_dir: None,
        }
    }
}

impl ServerConfig {
    /// Check values that clap cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        if self.navigation_timeout_ms == 0 {
            return Err(Error::ConfigError("navigation timeout must be positive".into()));
        }
        if self.analysis_timeout_ms < self.navigation_timeout_ms {
            return Err(Error::ConfigError(format!(
                "analysis timeout ({}ms) must not be shorter than navigation timeout ({}ms)",
                self.analysis_timeout_ms, self.navigation_timeout_ms
            )));
        }
        if let Some(path) = &self.chrome_path {
            if !path.exists() {
                return Err(Error::ConfigError(format!(
                    "browser executable {} does not exist",
                    path.display()
                )));
            }
        }
        if let Some(dir) = &self.static_dir {
            if !dir.is_dir() {
                return Err(Error::ConfigError(format!("static dir {} is not a directory", dir.display())));
            }
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::ConfigError(format!("invalid listen address {}:{}: {}", self.host, self.port, e)))
    }

    /// Per-browser settings derived from this config.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            user_agent: self.user_agent.clone(),
            timeout_ms: self.navigation_timeout_ms,
            settle_ms: self.settle_ms,
            chrome_path: self.chrome_path.clone(),
            sandbox: !self.no_sandbox,
            ..Default::default()
        }
    }
}
