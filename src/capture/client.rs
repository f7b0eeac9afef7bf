use anyhow::{Context, Result};
use fantoccini::{Client, ClientBuilder};
use tracing::{debug, error, trace};

use crate::capture::config::{self, CaptureConfig};

/// Creates a new WebDriver client configured for full-page captures
///
/// Sets up a Chrome instance with the hardening arguments, viewport, and
/// desktop user agent the capture pipeline expects.
pub async fn create_client(config: &CaptureConfig) -> Result<Client> {
    trace!("Creating new WebDriver client connecting to {}", config.webdriver_url);
    let mut caps = serde_json::map::Map::new();
    let mut chrome_opts = serde_json::map::Map::new();

    debug!("Configuring Chrome options with headless={}", config.headless);
    let args = config::chrome_arguments(config);

    trace!("Setting Chrome arguments: {:?}", args);
    chrome_opts.insert(
        "args".to_string(),
        serde_json::Value::Array(args.into_iter().map(serde_json::Value::String).collect()),
    );

    caps.insert(
        "goog:chromeOptions".to_string(),
        serde_json::Value::Object(chrome_opts),
    );

    debug!("Connecting to WebDriver at {}", config.webdriver_url);
    let client = match ClientBuilder::native()
        .capabilities(caps)
        .connect(&config.webdriver_url)
        .await
    {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to WebDriver at {}: {}", config.webdriver_url, e);
            return Err(e)
                .context(format!("Failed to connect to WebDriver at {}", config.webdriver_url));
        }
    };

    // Pin the window to the configured viewport
    debug!(
        "Setting window size to {}x{}",
        config.viewport_width, config.viewport_height
    );
    if let Err(e) = client
        .set_window_size(config.viewport_width, config.viewport_height)
        .await
    {
        // Not critical; the --window-size argument usually already applied
        error!(
            "Failed to set window size to {}x{}: {}",
            config.viewport_width, config.viewport_height, e
        );
    }

    trace!("Successfully created WebDriver client");
    Ok(client)
}
