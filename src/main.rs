mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use cli::{Cli, Command};
use sitesnap::api::{start_server, ApiConfig};
use sitesnap::capture::CaptureConfig;
use sitesnap::runner::{self, RunMode, RunRequest};
use sitesnap::tasks::RunLog;
use sitesnap::utils::logger::init_logger;

#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _ = init_logger("logs");

    match cli.command {
        Command::Capture {
            input,
            url,
            urls_file,
            output,
            no_headless,
            wait_time,
            max_pages,
            start_from,
            webdriver_url,
        } => {
            let capture = CaptureConfig {
                webdriver_url,
                headless: !no_headless,
                wait_time: Duration::from_secs(wait_time),
                ..CaptureConfig::default()
            };
            run_capture(input, url, urls_file, output, capture, max_pages, start_from).await
        }
        Command::Serve {
            host,
            port,
            screenshot_dir,
            webdriver_url,
        } => {
            let config = ApiConfig {
                screenshot_dir,
                capture: CaptureConfig {
                    webdriver_url,
                    ..CaptureConfig::default()
                },
            };
            println!("Starting screenshot web server...");
            println!("Open http://localhost:{} in your browser", port);
            start_server(&host, port, config).await
        }
    }
}

async fn run_capture(
    input: Option<String>,
    url: Option<String>,
    urls_file: Option<PathBuf>,
    output: PathBuf,
    capture: CaptureConfig,
    max_pages: Option<usize>,
    start_from: usize,
) -> Result<()> {
    let (mode, input, urls) = if let Some(url) = url {
        (RunMode::Single, url, Vec::new())
    } else if let Some(path) = urls_file {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read URLs file: {}", path.display()))?;
        let urls: Vec<String> = content.lines().map(str::to_string).collect();
        (RunMode::List, String::new(), urls)
    } else if let Some(input) = input {
        (RunMode::Site, input, Vec::new())
    } else {
        bail!("Provide a sitemap/homepage URL, or use --url / --urls-file");
    };

    let request = RunRequest {
        mode,
        input,
        urls,
        output_dir: output,
        capture,
        start_from,
        max_pages,
    };

    let summary = runner::execute(request, RunLog::stdout()).await?;
    if summary.total > 0 && summary.successful == 0 {
        bail!("All {} pages failed to capture", summary.total);
    }
    Ok(())
}
