use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sitesnap::capture::config::DEFAULT_WEBDRIVER_URL;

/// Full-page screenshots for every URL in a website's sitemap, with a web
/// dashboard for running and tracking capture tasks.
#[derive(Debug, Parser)]
#[command(name = "sitesnap", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a one-shot capture from the command line
    Capture {
        /// Sitemap XML file, sitemap URL, or homepage URL (sitemap is
        /// auto-discovered for homepages)
        input: Option<String>,

        /// Screenshot a single URL directly (bypasses the sitemap)
        #[arg(long)]
        url: Option<String>,

        /// File with one URL per line to screenshot
        #[arg(long)]
        urls_file: Option<PathBuf>,

        /// Output directory for screenshots
        #[arg(short, long, default_value = "screenshots")]
        output: PathBuf,

        /// Run the browser in visible mode
        #[arg(long)]
        no_headless: bool,

        /// Seconds to wait after each page load
        #[arg(short = 'w', long, default_value_t = 2)]
        wait_time: u64,

        /// Maximum number of pages to screenshot
        #[arg(long)]
        max_pages: Option<usize>,

        /// Start from this index (useful for resuming)
        #[arg(long, default_value_t = 0)]
        start_from: usize,

        /// WebDriver server URL
        #[arg(long, default_value = DEFAULT_WEBDRIVER_URL)]
        webdriver_url: String,
    },

    /// Start the dashboard and JSON API
    Serve {
        /// Address to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = 5001)]
        port: u16,

        /// Root directory for task output
        #[arg(long, default_value = "screenshots")]
        screenshot_dir: PathBuf,

        /// WebDriver server URL
        #[arg(long, default_value = DEFAULT_WEBDRIVER_URL)]
        webdriver_url: String,
    },
}
