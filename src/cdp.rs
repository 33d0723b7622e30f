//! Chrome DevTools Protocol adapter implementation

use crate::{Engine, EngineConfig, Error, Launch, Result, ScriptResult};
use headless_chrome::browser::tab::Tab;
use headless_chrome::{Browser, LaunchOptions};
use log::debug;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

/// CDP-based headless engine implementation (uses the `headless_chrome` crate)
///
/// This adapter launches a headless Chrome process, manages a single tab,
/// and provides the `Engine` trait implementation over it. Dropping the
/// engine kills the Chrome process.
pub struct CdpEngine {
    browser: Browser,
    tab: Arc<Tab>,
    config: EngineConfig,
}

impl Engine for CdpEngine {
    fn new(config: EngineConfig) -> Result<Self>
    where
        Self: Sized,
    {
        let mut args: Vec<&OsStr> = vec![
            OsStr::new("--disable-gpu"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-extensions"),
            OsStr::new("--hide-scrollbars"),
        ];
        if !config.sandbox {
            args.push(OsStr::new("--disable-setuid-sandbox"));
        }

        // Configure headless Chrome launch options. With no explicit path,
        // headless_chrome looks at $CHROME, then PATH, then known install dirs.
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(config.sandbox)
            .path(config.chrome_path.clone())
            .window_size(Some((config.viewport.width, config.viewport.height)))
            .idle_browser_timeout(Duration::from_millis(config.idle_browser_timeout_ms))
            .args(args)
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build launch options: {}", e)))?;

        // Launch the browser
        let browser = Browser::new(launch_options)
            .map_err(|e| Error::InitializationError(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;

        tab.set_default_timeout(Duration::from_millis(config.timeout_ms));

        if let Some(user_agent) = &config.user_agent {
            tab.set_user_agent(user_agent, None, None)
                .map_err(|e| Error::InitializationError(format!("Failed to set user agent: {}", e)))?;
        }

        debug!("Chrome launched (sandbox: {})", config.sandbox);

        Ok(Self { browser, tab, config })
    }

    fn load_url(&mut self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| Error::LoadError(format!("Navigation failed: {}", e)))?;

        // Resolves on Chrome's `networkAlmostIdle` lifecycle event (no more
        // than 2 connections for 500ms), bounded by the tab default timeout.
        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::LoadError(format!("Wait for network idle failed: {}", e)))?;

        if self.config.settle_ms > 0 {
            std::thread::sleep(Duration::from_millis(self.config.settle_ms));
        }

        Ok(())
    }

    /// Direct page evaluation that runs in the page's global context and can access
    /// the DOM and computed styles.
    fn evaluate_script_in_page(&mut self, script: &str) -> Result<ScriptResult> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| Error::ScriptError(format!("Direct evaluation failed: {}", e)))?;

        let value = match result.value {
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => "null".to_string(),
        };

        Ok(ScriptResult { value, is_error: false })
    }

    fn current_url(&self) -> String {
        self.tab.get_url()
    }

    fn close(self) -> Result<()> {
        // Drop the tab before the browser so the child process is terminated
        // promptly.
        drop(self.tab);
        drop(self.browser);
        debug!("Chrome closed");
        Ok(())
    }
}

/// Launches a fresh `CdpEngine` for every analysis.
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    config: EngineConfig,
}

impl ChromeLauncher {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Launch for ChromeLauncher {
    type Engine = CdpEngine;

    fn launch(&self) -> Result<CdpEngine> {
        CdpEngine::new(self.config.clone())
    }
}
