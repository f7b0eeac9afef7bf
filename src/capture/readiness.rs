use anyhow::{Context, Result};
use fantoccini::Client;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace, warn};

use crate::capture::config::{
    IMAGE_POLL_INTERVAL, IMAGE_WAIT_TIMEOUT, JUMP_SCROLL_PAUSE, MAX_SCROLL_ITERATIONS,
    SCROLL_STEP_FRACTION, SCROLL_STEP_PAUSE, SETTLE_PAUSE,
};

/// Coaxes a freshly loaded page into a fully rendered state before capture.
///
/// The sequence is fixed: settle wait, a jump scroll to the bottom to kick
/// off lazy loading, an incremental scroll pass that follows the page as it
/// grows, a return to the top, an image-completeness wait, and a final
/// settle wait. Timeouts inside the sequence are non-fatal; a page that
/// never finishes loading images still gets captured.
pub async fn settle_page(client: &Client, viewport_height: u32, wait_time: Duration) -> Result<()> {
    // Let the initial render finish
    sleep(wait_time).await;

    let mut current_height = scroll_height(client).await?;
    debug!("Initial page height: {}px", current_height);

    // Jump to the bottom first to trigger lazy-loaded content
    scroll_to(client, current_height).await?;
    sleep(JUMP_SCROLL_PAUSE).await;

    // Incremental pass so every section gets a chance to load
    let step = viewport_height as f64 * SCROLL_STEP_FRACTION;
    let mut position = 0.0_f64;
    let mut iterations = 0u32;

    while iterations < MAX_SCROLL_ITERATIONS && position < current_height {
        scroll_to(client, position).await?;
        sleep(SCROLL_STEP_PAUSE).await;

        // The page may have grown while we scrolled
        let new_height = scroll_height(client).await?;
        if new_height > current_height {
            trace!("Page grew from {}px to {}px during scroll", current_height, new_height);
            current_height = new_height;
        }

        position += step;
        iterations += 1;
    }
    debug!("Incremental scroll finished after {} steps", iterations);

    // Bottom once more, then back to the top for the capture
    scroll_to(client, current_height).await?;
    sleep(SETTLE_PAUSE).await;
    scroll_to(client, 0.0).await?;
    sleep(SETTLE_PAUSE).await;

    // Wait for images, bounded; timing out here is fine
    if !wait_for_images(client).await? {
        warn!("Images still loading after {:?}, capturing anyway", IMAGE_WAIT_TIMEOUT);
    }

    // CSS transitions, then any remaining dynamic content
    sleep(SETTLE_PAUSE).await;
    sleep(wait_time).await;

    Ok(())
}

/// Full document height in CSS pixels.
pub async fn scroll_height(client: &Client) -> Result<f64> {
    let value = client
        .execute("return document.body.scrollHeight;", vec![])
        .await
        .context("Failed to read document height")?;
    Ok(value.as_f64().unwrap_or(0.0))
}

async fn scroll_to(client: &Client, y: f64) -> Result<()> {
    client
        .execute("window.scrollTo(0, arguments[0]);", vec![serde_json::json!(y)])
        .await
        .context("Failed to scroll page")?;
    Ok(())
}

/// Polls until every image on the page reports complete, bounded by
/// `IMAGE_WAIT_TIMEOUT`. Returns whether the images finished in time.
async fn wait_for_images(client: &Client) -> Result<bool> {
    let deadline = Instant::now() + IMAGE_WAIT_TIMEOUT;
    loop {
        let done = client
            .execute(
                "return Array.from(document.images)\
                 .every(img => img.complete || img.naturalHeight > 0);",
                vec![],
            )
            .await
            .context("Failed to check image load state")?;

        if done.as_bool().unwrap_or(false) {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        sleep(IMAGE_POLL_INTERVAL).await;
    }
}
