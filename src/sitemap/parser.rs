use anyhow::{anyhow, bail, Context, Result};
use reqwest::Client;
use scraper::{Html, Selector};
use std::fs;
use tracing::{debug, info, warn};

use crate::sitemap::SitemapConfig;

/// One parsed sitemap document: either an index referencing further
/// sitemaps, or a plain URL set.
#[derive(Debug, PartialEq)]
enum SitemapDocument {
    Index(Vec<String>),
    UrlSet(Vec<String>),
}

/// Parses a sitemap and returns every page URL it lists, using default
/// settings. Sitemap-index files are flattened recursively in document
/// order. `location` may be an `http(s)` URL or a local file path.
pub async fn parse_sitemap(location: &str) -> Result<Vec<String>> {
    parse_sitemap_with_config(location, &SitemapConfig::default()).await
}

/// Sitemap parsing with custom configuration.
pub async fn parse_sitemap_with_config(
    location: &str,
    config: &SitemapConfig,
) -> Result<Vec<String>> {
    let client = Client::builder()
        .timeout(config.fetch_timeout)
        .user_agent(&config.fetch_user_agent)
        .build()
        .context("Failed to build HTTP client for sitemap fetching")?;

    let mut urls = Vec::new();

    // Depth-first traversal over an explicit stack; nested sitemaps are
    // pushed in reverse so results come out in document order.
    let mut pending = vec![(location.to_string(), 0usize)];

    while let Some((current, depth)) = pending.pop() {
        debug!("Fetching sitemap: {} (depth {})", current, depth);
        let content = fetch_content(&client, &current).await?;

        match classify_document(&content)
            .with_context(|| format!("Failed to parse sitemap: {}", current))?
        {
            SitemapDocument::Index(children) => {
                info!("Found sitemap index with {} sitemaps", children.len());
                if depth + 1 > config.max_index_depth {
                    warn!(
                        "Sitemap index nesting exceeds depth limit ({}); skipping children of {}",
                        config.max_index_depth, current
                    );
                    continue;
                }
                for child in children.into_iter().rev() {
                    pending.push((child, depth + 1));
                }
            }
            SitemapDocument::UrlSet(page_urls) => {
                debug!("Sitemap {} lists {} URLs", current, page_urls.len());
                urls.extend(page_urls);
            }
        }
    }

    info!("Sitemap traversal complete: {} URLs found", urls.len());
    Ok(urls)
}

/// Fetches sitemap content from a URL or reads it from a local file.
async fn fetch_content(client: &Client, location: &str) -> Result<String> {
    if location.starts_with("http://") || location.starts_with("https://") {
        let resp = client
            .get(location)
            .send()
            .await
            .with_context(|| format!("Failed to fetch sitemap from {}", location))?;
        if !resp.status().is_success() {
            bail!("Sitemap fetch from {} returned status {}", location, resp.status());
        }
        resp.text()
            .await
            .with_context(|| format!("Failed to read sitemap body from {}", location))
    } else {
        fs::read_to_string(location)
            .with_context(|| format!("Failed to read sitemap file: {}", location))
    }
}

/// Extracts `<loc>` entries and decides whether a document is a sitemap
/// index or a URL set.
///
/// Synchronous on purpose: `scraper::Html` is not `Send`, so the parsed
/// document must never be held across an await point.
fn classify_document(content: &str) -> Result<SitemapDocument> {
    let doc = Html::parse_document(content);

    let sitemap_loc = Selector::parse("sitemap > loc")
        .map_err(|e| anyhow!("Invalid sitemap selector: {:?}", e))?;
    let url_loc = Selector::parse("url > loc")
        .map_err(|e| anyhow!("Invalid url selector: {:?}", e))?;

    let nested: Vec<String> = doc.select(&sitemap_loc).map(loc_text).collect();
    if !nested.is_empty() {
        return Ok(SitemapDocument::Index(nested));
    }

    let urls: Vec<String> = doc.select(&url_loc).map(loc_text).collect();
    if !urls.is_empty() {
        return Ok(SitemapDocument::UrlSet(urls));
    }

    // Nothing extracted: accept a genuinely empty urlset, reject anything
    // that does not even look like sitemap XML
    let head: String = content.chars().take(1024).collect();
    if head.contains("<urlset") || head.contains("<sitemapindex") {
        Ok(SitemapDocument::UrlSet(Vec::new()))
    } else {
        bail!("Document is not a sitemap (no <urlset> or <sitemapindex> found)")
    }
}

fn loc_text(element: scraper::ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const URLSET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url>
    <loc>https://example.com/</loc>
    <lastmod>2024-01-01</lastmod>
  </url>
  <url>
    <loc>
      https://example.com/about
    </loc>
  </url>
</urlset>"#;

    #[test]
    fn classifies_urlset_and_trims_locs() {
        let doc = classify_document(URLSET).unwrap();
        assert_eq!(
            doc,
            SitemapDocument::UrlSet(vec![
                "https://example.com/".to_string(),
                "https://example.com/about".to_string(),
            ])
        );
    }

    #[test]
    fn classifies_sitemap_index() {
        let xml = r#"<?xml version="1.0"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://example.com/sitemap-posts.xml</loc></sitemap>
  <sitemap><loc>https://example.com/sitemap-pages.xml</loc></sitemap>
</sitemapindex>"#;
        let doc = classify_document(xml).unwrap();
        assert_eq!(
            doc,
            SitemapDocument::Index(vec![
                "https://example.com/sitemap-posts.xml".to_string(),
                "https://example.com/sitemap-pages.xml".to_string(),
            ])
        );
    }

    #[test]
    fn empty_urlset_is_not_an_error() {
        let xml = r#"<?xml version="1.0"?><urlset xmlns="x"></urlset>"#;
        assert_eq!(
            classify_document(xml).unwrap(),
            SitemapDocument::UrlSet(Vec::new())
        );
    }

    #[test]
    fn non_sitemap_content_is_rejected() {
        assert!(classify_document("<!DOCTYPE html><html><body>hi</body></html>").is_err());
        assert!(classify_document("plain text").is_err());
    }

    #[tokio::test]
    async fn flattens_index_in_document_order() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();

        let index = format!(
            r#"<?xml version="1.0"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>{base}/posts.xml</loc></sitemap>
  <sitemap><loc>{base}/pages.xml</loc></sitemap>
</sitemapindex>"#
        );
        server
            .mock("GET", "/sitemap.xml")
            .with_status(200)
            .with_body(index)
            .create_async()
            .await;
        server
            .mock("GET", "/posts.xml")
            .with_status(200)
            .with_body(
                r#"<urlset><url><loc>https://example.com/post-1</loc></url>
                   <url><loc>https://example.com/post-2</loc></url></urlset>"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/pages.xml")
            .with_status(200)
            .with_body(r#"<urlset><url><loc>https://example.com/about</loc></url></urlset>"#)
            .create_async()
            .await;

        let urls = parse_sitemap(&format!("{}/sitemap.xml", base)).await.unwrap();
        assert_eq!(
            urls,
            vec![
                "https://example.com/post-1".to_string(),
                "https://example.com/post-2".to_string(),
                "https://example.com/about".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn cyclic_index_terminates_at_depth_limit() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();

        // sitemap.xml references itself forever
        let cyclic = format!(
            r#"<sitemapindex><sitemap><loc>{base}/sitemap.xml</loc></sitemap></sitemapindex>"#
        );
        server
            .mock("GET", "/sitemap.xml")
            .with_status(200)
            .with_body(cyclic)
            .expect_at_most(4)
            .create_async()
            .await;

        let config = SitemapConfig::default().with_max_index_depth(3);
        let urls = parse_sitemap_with_config(&format!("{}/sitemap.xml", base), &config)
            .await
            .unwrap();
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn http_error_status_fails_the_parse() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/sitemap.xml")
            .with_status(500)
            .create_async()
            .await;

        let result = parse_sitemap(&format!("{}/sitemap.xml", server.url())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn reads_local_sitemap_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitemap.xml");
        std::fs::write(&path, URLSET).unwrap();

        let urls = parse_sitemap(path.to_str().unwrap()).await.unwrap();
        assert_eq!(urls.len(), 2);
    }
}
