use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::sitemap::{looks_like_sitemap_xml, SitemapConfig};

/// Tries to discover the sitemap URL for a homepage using default settings.
///
/// Probes the well-known sitemap locations first, then falls back to
/// scanning `robots.txt` for a `Sitemap:` directive. Returns `Ok(None)`
/// when the site does not expose a discoverable sitemap.
pub async fn discover_sitemap(homepage_url: &str) -> Result<Option<String>> {
    discover_sitemap_with_config(homepage_url, &SitemapConfig::default()).await
}

/// Sitemap discovery with custom configuration.
pub async fn discover_sitemap_with_config(
    homepage_url: &str,
    config: &SitemapConfig,
) -> Result<Option<String>> {
    let parsed = Url::parse(homepage_url)
        .with_context(|| format!("Failed to parse homepage URL: {}", homepage_url))?;

    let mut base = parsed.clone();
    base.set_path("");
    base.set_query(None);
    base.set_fragment(None);

    info!("Looking for sitemap at {}", base);

    let client = Client::builder()
        .timeout(config.probe_timeout)
        .user_agent(&config.probe_user_agent)
        .build()
        .context("Failed to build HTTP client for sitemap discovery")?;

    // Probe the common sitemap locations in order
    for path in &config.probe_paths {
        let candidate = match base.join(path) {
            Ok(url) => url,
            Err(e) => {
                warn!("Skipping unjoinable probe path {}: {}", path, e);
                continue;
            }
        };

        trace!("Probing {}", candidate);
        match client.get(candidate.clone()).send().await {
            Ok(resp) if resp.status().is_success() => {
                let body = match resp.text().await {
                    Ok(body) => body,
                    Err(e) => {
                        debug!("Failed to read probe body from {}: {}", candidate, e);
                        continue;
                    }
                };
                // Sniff the head of the body to weed out HTML 404 pages
                // served with a 200 status
                let head: String = body.chars().take(1024).collect();
                if looks_like_sitemap_xml(&head) {
                    info!("Found sitemap at: {}", candidate);
                    return Ok(Some(candidate.to_string()));
                }
                debug!("Probe {} returned non-XML content", candidate);
            }
            Ok(resp) => {
                trace!("Probe {} returned status {}", candidate, resp.status());
            }
            Err(e) => {
                trace!("Probe {} failed: {}", candidate, e);
            }
        }
    }

    // Fall back to robots.txt
    let robots_url = match base.join("/robots.txt") {
        Ok(url) => url,
        Err(e) => {
            warn!("Could not build robots.txt URL for {}: {}", base, e);
            return Ok(None);
        }
    };

    debug!("Checking {} for a sitemap directive", robots_url);
    let robots = match client.get(robots_url.clone()).send().await {
        Ok(resp) if resp.status().is_success() => match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!("Failed to read robots.txt body: {}", e);
                return Ok(None);
            }
        },
        Ok(resp) => {
            debug!("robots.txt returned status {}", resp.status());
            return Ok(None);
        }
        Err(e) => {
            debug!("robots.txt fetch failed: {}", e);
            return Ok(None);
        }
    };

    for line in robots.lines() {
        if !line.trim().to_lowercase().starts_with("sitemap:") {
            continue;
        }
        let Some(candidate) = line.splitn(2, ':').nth(1).map(str::trim) else {
            continue;
        };
        if candidate.is_empty() {
            continue;
        }
        info!("Found sitemap in robots.txt: {}", candidate);

        // Verify the referenced sitemap actually responds before accepting it
        match client.get(candidate).send().await {
            Ok(resp) if resp.status().is_success() => {
                return Ok(Some(candidate.to_string()));
            }
            Ok(resp) => {
                warn!(
                    "Sitemap from robots.txt ({}) returned status {}",
                    candidate,
                    resp.status()
                );
            }
            Err(e) => {
                warn!("Sitemap from robots.txt ({}) unreachable: {}", candidate, e);
            }
        }
    }

    Ok(None)
}
