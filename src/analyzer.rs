//! The analysis pipeline: validate, launch, navigate, extract, release.

use crate::style::{self, AnalysisResult};
use crate::{Browser, Error, Launch, Result};
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default bound on a whole analysis, launch included.
pub const DEFAULT_ANALYSIS_TIMEOUT_MS: u64 = 60000;

/// Extracts fonts and colors from a page, one isolated browser per call.
pub struct PageStyleExtractor<L> {
    launcher: Arc<L>,
    timeout_ms: u64,
}

impl<L> Clone for PageStyleExtractor<L> {
    fn clone(&self) -> Self {
        Self {
            launcher: self.launcher.clone(),
            timeout_ms: self.timeout_ms,
        }
    }
}

impl<L: Launch> PageStyleExtractor<L> {
    pub fn new(launcher: L) -> Self {
        Self {
            launcher: Arc::new(launcher),
            timeout_ms: DEFAULT_ANALYSIS_TIMEOUT_MS,
        }
    }

    /// Bound the whole analysis to `timeout_ms` milliseconds.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Analyze `url` in a fresh browser instance.
    ///
    /// The browser is released on every exit path. If the deadline passes or
    /// the returned future is dropped, the worker closes the engine as soon
    /// as its in-flight command returns.
    pub async fn analyze(&self, url: &str) -> Result<AnalysisResult> {
        validate_url(url)?;
        info!("Analyzing {}", url);

        let res = tokio::time::timeout(Duration::from_millis(self.timeout_ms), self.run(url)).await;
        let result = match res {
            Ok(inner) => inner,
            Err(_) => Err(Error::Timeout(self.timeout_ms)),
        };

        match &result {
            Ok(r) => info!("Found {} fonts and {} colors on {}", r.fonts.len(), r.colors.len(), url),
            Err(e) => warn!("Analysis of {} failed: {}", url, e),
        }
        result
    }

    async fn run(&self, url: &str) -> Result<AnalysisResult> {
        let launcher = self.launcher.clone();
        let browser = Browser::spawn(move || launcher.launch()).await?;

        let extracted = extract(&browser, url).await;
        let closed = browser.close().await;

        let (fonts, colors) = extracted?;
        if let Err(e) = closed {
            warn!("Failed to close browser cleanly: {}", e);
        }
        Ok(AnalysisResult::new(url, fonts, colors))
    }
}

async fn extract(browser: &Browser, url: &str) -> Result<(Vec<String>, Vec<String>)> {
    browser.goto(url).await?;
    let landed = browser.current_url().await?;
    if landed != url {
        info!("{} redirected to {}", url, landed);
    }

    let font_payload = browser.eval_in_page(style::FONT_SCRIPT).await?;
    let fonts = style::collect_fonts(style::parse_font_payload(&font_payload)?);

    let color_payload = browser.eval_in_page(style::COLOR_SCRIPT).await?;
    let colors = style::collect_colors(&style::parse_color_payload(&color_payload)?);

    Ok((fonts, colors))
}

/// Accept only absolute `http`/`https` URLs.
pub fn validate_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("`url` must not be empty".into()));
    }
    let parsed = Url::parse(trimmed)
        .map_err(|e| Error::InvalidInput(format!("`url` is not a valid absolute URL: {}", e)))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::InvalidInput(format!(
                "unsupported URL scheme `{}`; expected http or https",
                other
            )))
        }
    }
    if parsed.host_str().is_none() {
        return Err(Error::InvalidInput("`url` has no host".into()));
    }
    Ok(parsed)
}
