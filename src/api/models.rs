use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tasks::TaskStatus;

fn default_mode() -> String {
    "single".to_string()
}

/// Request to start a screenshot run
#[derive(Debug, Deserialize)]
pub struct StartRequest {
    /// URL to screenshot (single mode) or homepage/sitemap URL (entire mode)
    #[serde(default)]
    pub url: Option<String>,

    /// One of `single`, `entire`, or `list`
    #[serde(default = "default_mode")]
    pub mode: String,

    /// URL list for list mode
    #[serde(default)]
    pub urls: Option<Vec<String>>,

    /// Seconds to wait after each page load
    #[serde(default)]
    pub wait_time: Option<u64>,

    /// Cap on the number of pages captured
    #[serde(default)]
    pub max_pages: Option<usize>,

    /// Skip this many URLs from the front
    #[serde(default)]
    pub start_from: Option<usize>,
}

/// Response after a run has been started
#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub task_id: Uuid,
    pub status: String,
    pub output_dir: String,
}

/// Task status snapshot for polling clients
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: TaskStatus,

    /// The most recent log lines
    pub output: Vec<String>,

    pub screenshot_count: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One saved screenshot file
#[derive(Debug, Serialize)]
pub struct ScreenshotEntry {
    pub filename: String,
    pub size: u64,
}

/// Listing of a task's saved screenshots
#[derive(Debug, Serialize)]
pub struct ScreenshotList {
    pub screenshots: Vec<ScreenshotEntry>,
}

/// Health status response for the /health endpoint
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Status indicator: currently always healthy
    pub status: String,

    /// Number of runs currently executing
    pub running_tasks: usize,

    /// Number of tasks tracked since startup
    pub tracked_tasks: usize,
}

/// Error response for API endpoints
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Status indicator: error
    pub status: String,

    /// Error message details
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}
