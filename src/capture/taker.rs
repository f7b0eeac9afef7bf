use anyhow::{anyhow, Context, Result};
use fantoccini::{Client, Locator};
use sanitize_filename::sanitize;
use std::fs;
use std::path::Path;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::capture::client::create_client;
use crate::capture::config::{
    CaptureConfig, MAX_CAPTURE_HEIGHT, MAX_RETRIES, NAVIGATION_TIMEOUT, RETRY_DELAY, SETTLE_PAUSE,
};
use crate::capture::model::CapturedPage;
use crate::capture::readiness::{scroll_height, settle_page};
use crate::utils::url_to_filename;

/// Drives one browser session and takes full-page screenshots.
///
/// The session is created lazily on the first capture and reused across
/// URLs; after a failed attempt the session is discarded and a fresh one is
/// created for the retry.
pub struct PageCapturer {
    config: CaptureConfig,
    client: Option<Client>,
}

impl PageCapturer {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config, client: None }
    }

    /// Navigates to `url` and saves a full-page PNG into `output_dir`,
    /// retrying with a fresh browser session on failure.
    pub async fn capture(&mut self, url: &str, output_dir: &Path) -> Result<CapturedPage> {
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            debug!("Capture attempt {}/{} for {}", attempt, MAX_RETRIES, url);

            let client = match self.ensure_client().await {
                Ok(client) => client,
                Err(e) => {
                    warn!("Failed to start browser session: {}", e);
                    last_error = Some(e);
                    if attempt < MAX_RETRIES {
                        sleep(RETRY_DELAY).await;
                    }
                    continue;
                }
            };

            match self.capture_with_client(&client, url, output_dir).await {
                Ok(page) => {
                    info!("Captured {} ({} bytes)", url, page.byte_len);
                    return Ok(page);
                }
                Err(e) => {
                    warn!("Failed to capture {}: {}", url, e);
                    last_error = Some(e);
                    // The session may be wedged; drop it and retry fresh
                    self.discard_client().await;
                    if attempt < MAX_RETRIES {
                        debug!("Waiting {:?} before retry", RETRY_DELAY);
                        sleep(RETRY_DELAY).await;
                    }
                }
            }
        }

        error!("Failed to capture {} after {} attempts", url, MAX_RETRIES);
        Err(last_error
            .unwrap_or_else(|| anyhow!("Failed to capture {} after {} retries", url, MAX_RETRIES)))
    }

    async fn capture_with_client(
        &self,
        client: &Client,
        url: &str,
        output_dir: &Path,
    ) -> Result<CapturedPage> {
        debug!("Navigating to URL: {}", url);
        timeout(NAVIGATION_TIMEOUT, client.goto(url))
            .await
            .map_err(|_| anyhow!("Timed out loading {} after {:?}", url, NAVIGATION_TIMEOUT))?
            .with_context(|| format!("Failed to navigate to {}", url))?;

        client
            .wait()
            .at_most(NAVIGATION_TIMEOUT)
            .for_element(Locator::Css("body"))
            .await
            .context("Failed to wait for page body")?;

        settle_page(client, self.config.viewport_height, self.config.wait_time).await?;

        // WebDriver has no full-page capture, so grow the window to cover
        // the measured document height, shoot, and restore it
        let page_height = scroll_height(client).await?.round() as u32;
        let capture_height = page_height
            .clamp(self.config.viewport_height, MAX_CAPTURE_HEIGHT);
        debug!("Resizing window to {}x{} for capture", self.config.viewport_width, capture_height);
        client
            .set_window_size(self.config.viewport_width, capture_height)
            .await
            .context("Failed to resize window for full-page capture")?;
        sleep(SETTLE_PAUSE).await;

        let result = client.screenshot().await.context("Failed to capture screenshot");

        // Restore before propagating any capture error
        if let Err(e) = client
            .set_window_size(self.config.viewport_width, self.config.viewport_height)
            .await
        {
            warn!("Failed to restore window size: {}", e);
        }
        let image = result?;

        let file_name = format!("{}.png", sanitize(url_to_filename(url)));
        let file_path = output_dir.join(file_name);
        debug!("Saving screenshot to {}", file_path.display());
        fs::write(&file_path, &image)
            .with_context(|| format!("Failed to write screenshot to {}", file_path.display()))?;

        Ok(CapturedPage::new(file_path, image.len()))
    }

    async fn ensure_client(&mut self) -> Result<Client> {
        if self.client.is_none() {
            info!("Launching browser session via {}", self.config.webdriver_url);
            let client = create_client(&self.config).await?;
            self.client = Some(client);
        }
        self.client
            .clone()
            .ok_or_else(|| anyhow!("Browser session unavailable"))
    }

    async fn discard_client(&mut self) {
        if let Some(client) = self.client.take() {
            debug!("Discarding browser session");
            if let Err(e) = client.close().await {
                warn!("Error closing browser session: {}", e);
            }
        }
    }

    /// Closes the browser session if one is open.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            info!("Closing browser session");
            client.close().await.context("Failed to close browser session")?;
        }
        Ok(())
    }
}
