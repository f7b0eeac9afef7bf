use anyhow::{bail, Result};
use std::path::PathBuf;
use tracing::instrument;

use crate::capture::{CaptureConfig, PageCapturer};
use crate::sitemap::{discover_sitemap, looks_like_sitemap, parse_sitemap};
use crate::tasks::RunLog;

/// How a run turns its input into a URL list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Screenshot exactly the given URL
    Single,
    /// Discover and parse the site's sitemap
    Site,
    /// Screenshot an explicit list of URLs
    List,
}

/// One screenshot run, CLI or API initiated
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub mode: RunMode,

    /// Homepage, sitemap URL, sitemap file, or single URL depending on mode
    pub input: String,

    /// URL list for `RunMode::List`
    pub urls: Vec<String>,

    /// Directory the PNGs are written into
    pub output_dir: PathBuf,

    pub capture: CaptureConfig,

    /// Skip this many URLs from the front (for resuming)
    pub start_from: usize,

    /// Cap on the number of pages captured
    pub max_pages: Option<usize>,
}

/// Outcome counters for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub successful: usize,
    pub failed: usize,
    pub total: usize,
}

/// Executes a screenshot run from start to finish: resolve the URL list,
/// apply limits, then capture each page sequentially with one browser
/// session. A page that fails is counted and skipped; only setup problems
/// (no sitemap, no valid URLs, browser never starts) abort the run.
#[instrument(skip(request, log), fields(mode = ?request.mode, input = %request.input))]
pub async fn execute(request: RunRequest, log: RunLog) -> Result<RunSummary> {
    let mut urls = resolve_urls(&request, &log).await?;

    if urls.is_empty() {
        log.line("No URLs found in sitemap!").await;
        return Ok(RunSummary::default());
    }
    log.line(format!("Found {} URLs", urls.len())).await;

    // Resume offset and page cap only make sense against a URL list
    if request.mode != RunMode::Single {
        if request.start_from > 0 {
            log.line(format!("Starting from index {}", request.start_from)).await;
        }
        if let Some(max) = request.max_pages {
            log.line(format!("Limiting to {} pages", max)).await;
        }
    }
    urls = apply_limits(request.mode, urls, request.start_from, request.max_pages);

    std::fs::create_dir_all(&request.output_dir)?;
    log.line(format!("Saving screenshots to: {}", request.output_dir.display())).await;

    log.line("Launching browser...").await;
    let mut capturer = PageCapturer::new(request.capture.clone());

    let total = urls.len();
    let mut summary = RunSummary { total, ..Default::default() };

    for (i, url) in urls.iter().enumerate() {
        log.line(format!("[{}/{}] Processing: {}", i + 1, total, url)).await;
        match capturer.capture(url, &request.output_dir).await {
            Ok(page) => {
                summary.successful += 1;
                log.line(format!("  ✓ Saved: {}", page.file_name())).await;
            }
            Err(e) => {
                summary.failed += 1;
                log.line(format!("  ✗ Error screenshotting {}: {:#}", url, e)).await;
            }
        }
    }

    if let Err(e) = capturer.close().await {
        log.line(format!("Warning: failed to close browser: {}", e)).await;
    }

    log.line("=".repeat(60)).await;
    log.line("Complete!").await;
    log.line(format!("  Successful: {}", summary.successful)).await;
    log.line(format!("  Failed: {}", summary.failed)).await;
    log.line(format!("  Total: {}", summary.total)).await;

    Ok(summary)
}

/// Resolves the run input into a flat URL list according to the mode.
async fn resolve_urls(request: &RunRequest, log: &RunLog) -> Result<Vec<String>> {
    match request.mode {
        RunMode::Single => {
            log.line(format!("Screenshotting single URL: {}", request.input)).await;
            Ok(vec![request.input.clone()])
        }
        RunMode::List => {
            let urls = normalize_url_list(&request.urls);
            if urls.is_empty() {
                bail!("URL list contains no valid http(s) URLs");
            }
            log.line(format!("Screenshotting {} listed URLs", urls.len())).await;
            Ok(urls)
        }
        RunMode::Site => {
            let sitemap = if looks_like_sitemap(&request.input) {
                request.input.clone()
            } else {
                log.line(format!("Looking for sitemap at {}...", request.input)).await;
                match discover_sitemap(&request.input).await? {
                    Some(found) => {
                        log.line(format!("  ✓ Found sitemap at: {}", found)).await;
                        found
                    }
                    None => {
                        bail!(
                            "Could not automatically find sitemap for {} \
                             (tried common locations and robots.txt); \
                             provide the sitemap URL directly",
                            request.input
                        );
                    }
                }
            };

            log.line(format!("Parsing sitemap: {}", sitemap)).await;
            parse_sitemap(&sitemap).await
        }
    }
}

/// Keeps only trimmed `http(s)://` entries, preserving order.
pub fn normalize_url_list(urls: &[String]) -> Vec<String> {
    urls.iter()
        .map(|u| u.trim().to_string())
        .filter(|u| u.starts_with("http://") || u.starts_with("https://"))
        .collect()
}

/// Applies the resume offset and the page cap. Single-URL runs are exempt:
/// there is no list to resume into or cap.
fn apply_limits(
    mode: RunMode,
    urls: Vec<String>,
    start_from: usize,
    max_pages: Option<usize>,
) -> Vec<String> {
    if mode == RunMode::Single {
        return urls;
    }
    let mut urls: Vec<String> = urls.into_iter().skip(start_from).collect();
    if let Some(max) = max_pages {
        urls.truncate(max);
    }
    urls
}
