//! Pagestyle
//!
//! Loads a web page in headless Chrome and extracts a small visual
//! fingerprint: the distinct font families in use and up to four dominant
//! foreground/background colors.
//!
//! # Features
//!
//! - **CDP Backend** (default): Uses Chrome DevTools Protocol via headless Chrome
//! - **Isolation**: every analysis launches its own browser process, released on
//!   every exit path
//! - **HTTP surface**: an `axum` router exposing `POST /analyze`
//!
//! # Example
//!
//! ```no_run
//! use pagestyle::analyzer::PageStyleExtractor;
//! use pagestyle::cdp::ChromeLauncher;
//! use pagestyle::EngineConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = PageStyleExtractor::new(ChromeLauncher::new(EngineConfig::default()));
//! let result = extractor.analyze("https://example.com").await?;
//! for font in &result.fonts {
//!     println!("{}", font.family);
//! }
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

pub mod error;
pub use error::{Error, Result};

#[cfg(feature = "cdp")]
pub mod cdp;

// Async-friendly browser handle (worker-thread-backed abstraction)
pub mod async_api;
pub use async_api::Browser;

pub mod analyzer;
pub mod config;
pub mod server;
pub mod style;

/// Configuration for a single headless browser instance
///
/// Defaults are conservative: the Chrome sandbox stays on, Chrome's own
/// user agent is kept, and navigation is bounded to 30 seconds.
///
/// # Examples
///
/// ```
/// let cfg = pagestyle::EngineConfig::default();
/// assert!(cfg.sandbox);
/// assert_eq!(cfg.timeout_ms, 30000);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// User agent override; `None` keeps the browser default
    pub user_agent: Option<String>,
    /// Viewport dimensions
    pub viewport: Viewport,
    /// Timeout for page loads in milliseconds
    pub timeout_ms: u64,
    /// Extra delay after the network settles, in milliseconds
    pub settle_ms: u64,
    /// Browser executable; `None` lets the backend discover one
    pub chrome_path: Option<PathBuf>,
    /// Whether to keep the Chrome sandbox enabled
    pub sandbox: bool,
    /// How long an idle browser connection is kept before the backend drops it
    pub idle_browser_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            viewport: Viewport::default(),
            timeout_ms: 30000,
            settle_ms: 0,
            chrome_path: None,
            sandbox: true,
            idle_browser_timeout_ms: 60000,
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Result of JavaScript execution
///
/// `value` is the serialized result of the evaluation. Extraction scripts
/// return a JSON string, so for them `value` is the raw JSON text.
#[derive(Debug, Clone)]
pub struct ScriptResult {
    /// Serialized result value
    pub value: String,
    /// Whether the script threw an error
    pub is_error: bool,
}

/// Core trait for headless engine implementations
///
/// Engines are synchronous and need not be `Send`; the async layer owns each
/// one on a dedicated worker thread.
pub trait Engine {
    /// Create a new engine instance with the given configuration
    fn new(config: EngineConfig) -> Result<Self>
    where
        Self: Sized;

    /// Load a URL and wait for the page to be ready
    fn load_url(&mut self, url: &str) -> Result<()>;

    /// Evaluate JavaScript in the page's global context, with DOM access
    fn evaluate_script_in_page(&mut self, script: &str) -> Result<ScriptResult>;

    /// URL of the current document, after redirects
    fn current_url(&self) -> String;

    /// Close the engine and clean up resources
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// Factory producing one fresh engine per analysis.
///
/// `launch` runs on the worker thread that will own the engine.
pub trait Launch: Send + Sync + 'static {
    type Engine: Engine + 'static;

    fn launch(&self) -> Result<Self::Engine>;
}
