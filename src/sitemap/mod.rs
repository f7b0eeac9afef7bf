mod discover;
mod parser;

pub use discover::{discover_sitemap, discover_sitemap_with_config};
pub use parser::{parse_sitemap, parse_sitemap_with_config};

use std::time::Duration;

// Constants for sitemap fetching behavior
const PROBE_TIMEOUT: u64 = 10; // seconds
const FETCH_TIMEOUT: u64 = 30; // seconds
const MAX_INDEX_DEPTH: usize = 5;
const PROBE_USER_AGENT: &str = "Mozilla/5.0 (compatible; SitemapBot/1.0)";
const FETCH_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Well-known locations probed during sitemap discovery, in order.
const WELL_KNOWN_PATHS: [&str; 5] = [
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap/sitemap.xml",
    "/sitemaps/sitemap.xml",
    "/sitemap1.xml",
];

/// Configuration for sitemap discovery and parsing
///
/// Controls probe locations, HTTP timeouts, user agents, and how deep
/// a chain of sitemap-index files may nest before traversal stops.
#[derive(Debug, Clone)]
pub struct SitemapConfig {
    pub probe_paths: Vec<String>,
    pub probe_timeout: Duration,
    pub fetch_timeout: Duration,
    pub probe_user_agent: String,
    pub fetch_user_agent: String,
    pub max_index_depth: usize,
}

impl SitemapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the well-known paths probed during discovery
    pub fn with_probe_paths(mut self, paths: Vec<String>) -> Self {
        self.probe_paths = paths;
        self
    }

    /// Sets the timeout for discovery probe requests
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Sets the timeout for sitemap fetch requests
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Sets the user agent used during discovery probes
    pub fn with_probe_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.probe_user_agent = user_agent.into();
        self
    }

    /// Sets the user agent used when fetching sitemap documents
    pub fn with_fetch_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.fetch_user_agent = user_agent.into();
        self
    }

    /// Sets the maximum nesting depth for sitemap-index traversal
    pub fn with_max_index_depth(mut self, depth: usize) -> Self {
        self.max_index_depth = depth;
        self
    }
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            probe_paths: WELL_KNOWN_PATHS.iter().map(|p| p.to_string()).collect(),
            probe_timeout: Duration::from_secs(PROBE_TIMEOUT),
            fetch_timeout: Duration::from_secs(FETCH_TIMEOUT),
            probe_user_agent: PROBE_USER_AGENT.to_string(),
            fetch_user_agent: FETCH_USER_AGENT.to_string(),
            max_index_depth: MAX_INDEX_DEPTH,
        }
    }
}

/// Returns true when the run input already names a sitemap (URL or local
/// file) rather than a homepage that needs discovery.
pub fn looks_like_sitemap(input: &str) -> bool {
    if !input.starts_with("http://") && !input.starts_with("https://") {
        // Local paths always go straight to the parser
        return true;
    }
    let lowered = input.to_lowercase();
    lowered.contains("sitemap") || lowered.contains(".xml")
}

/// Quick check that a response body is plausibly sitemap XML.
fn looks_like_sitemap_xml(body: &str) -> bool {
    body.contains("<?xml") || body.contains("<urlset") || body.contains("<sitemapindex")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = SitemapConfig::new()
            .with_probe_paths(vec!["/custom.xml".to_string()])
            .with_probe_timeout(Duration::from_secs(2))
            .with_fetch_timeout(Duration::from_secs(5))
            .with_probe_user_agent("Probe/1.0")
            .with_fetch_user_agent("Fetch/1.0")
            .with_max_index_depth(2);

        assert_eq!(config.probe_paths, vec!["/custom.xml".to_string()]);
        assert_eq!(config.probe_timeout, Duration::from_secs(2));
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.probe_user_agent, "Probe/1.0");
        assert_eq!(config.fetch_user_agent, "Fetch/1.0");
        assert_eq!(config.max_index_depth, 2);
    }

    #[test]
    fn homepage_urls_need_discovery() {
        assert!(!looks_like_sitemap("https://example.com"));
        assert!(!looks_like_sitemap("http://example.com/about"));
    }

    #[test]
    fn sitemap_urls_and_files_skip_discovery() {
        assert!(looks_like_sitemap("https://example.com/sitemap.xml"));
        assert!(looks_like_sitemap("https://example.com/SITEMAP_index.XML"));
        assert!(looks_like_sitemap("https://example.com/feed.xml"));
        assert!(looks_like_sitemap("./local-sitemap.xml"));
    }

    #[test]
    fn xml_sniffing() {
        assert!(looks_like_sitemap_xml("<?xml version=\"1.0\"?><urlset>"));
        assert!(looks_like_sitemap_xml("<sitemapindex xmlns=\"x\">"));
        assert!(!looks_like_sitemap_xml("<!DOCTYPE html><html></html>"));
    }
}
