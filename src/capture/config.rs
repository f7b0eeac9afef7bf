use std::time::Duration;

// Constants for capture behavior and the page readiness heuristic
pub const MAX_RETRIES: u32 = 3;            // Maximum number of capture attempts per URL
pub const RETRY_DELAY: Duration = Duration::from_secs(1);  // Delay between retry attempts
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(60); // Page load timeout
pub const JUMP_SCROLL_PAUSE: Duration = Duration::from_millis(500); // After the first jump to the bottom
pub const SCROLL_STEP_PAUSE: Duration = Duration::from_millis(150); // Between incremental scroll steps
pub const SETTLE_PAUSE: Duration = Duration::from_millis(300);      // Short pauses around scrolling
pub const MAX_SCROLL_ITERATIONS: u32 = 15; // Bound on the incremental scroll loop
pub const SCROLL_STEP_FRACTION: f64 = 0.8; // Step size as a fraction of viewport height
pub const IMAGE_WAIT_TIMEOUT: Duration = Duration::from_secs(5);    // Bound on image-load polling
pub const IMAGE_POLL_INTERVAL: Duration = Duration::from_millis(250);
pub const MAX_CAPTURE_HEIGHT: u32 = 16384; // Chrome texture limit for a single capture

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Configuration for a capture session
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// WebDriver server URL
    pub webdriver_url: String,

    /// Width of the browser viewport
    pub viewport_width: u32,

    /// Height of the browser viewport
    pub viewport_height: u32,

    /// Whether to run the browser in headless mode
    pub headless: bool,

    /// Seconds to let the page settle after load and again before capture
    pub wait_time: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            viewport_width: 1920,
            viewport_height: 1080,
            headless: true,
            wait_time: Duration::from_secs(2),
        }
    }
}

// Chrome browser arguments
pub fn chrome_arguments(config: &CaptureConfig) -> Vec<String> {
    vec![
        "--no-sandbox".to_string(),
        "--disable-gpu".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-extensions".to_string(),
        "--disable-notifications".to_string(),
        "--disable-infobars".to_string(),
        "--disable-popup-blocking".to_string(),
        "--disable-background-networking".to_string(),
        "--disable-background-timer-throttling".to_string(),
        "--disable-backgrounding-occluded-windows".to_string(),
        "--disable-breakpad".to_string(),
        "--disable-component-extensions-with-background-pages".to_string(),
        "--disable-features=TranslateUI".to_string(),
        "--disable-ipc-flooding-protection".to_string(),
        "--disable-renderer-backgrounding".to_string(),
        "--enable-features=NetworkService,NetworkServiceInProcess".to_string(),
        "--force-color-profile=srgb".to_string(),
        "--metrics-recording-only".to_string(),
        "--mute-audio".to_string(),
        format!("--window-size={},{}", config.viewport_width, config.viewport_height),
        format!("--user-agent={}", USER_AGENT),
    ]
    .into_iter()
    .chain(config.headless.then(|| "--headless=new".to_string()))
    .collect()
}
