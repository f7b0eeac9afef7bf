use actix_web::{web, HttpResponse, Responder};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::api::config::{ApiConfig, STATUS_TAIL_LINES};
use crate::api::models::{
    ErrorResponse, HealthStatus, ScreenshotEntry, ScreenshotList, StartRequest, StartResponse,
    StatusResponse,
};
use crate::runner::{self, normalize_url_list, RunMode, RunRequest};
use crate::tasks::{RunLog, TaskRegistry};

/// Serves the dashboard page.
pub async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(include_str!("../../static/index.html"))
}

/// Health check endpoint for monitoring service status
#[instrument(skip(registry))]
pub async fn health(registry: web::Data<TaskRegistry>) -> impl Responder {
    let running = registry.running_count().await;
    let tracked = registry.total_count().await;
    debug!("Health check: running={}, tracked={}", running, tracked);
    HttpResponse::Ok().json(HealthStatus {
        status: "healthy".to_string(),
        running_tasks: running,
        tracked_tasks: tracked,
    })
}

/// Starts a screenshot run in the background
///
/// Validates the request, registers a task, creates its output directory,
/// and spawns the run. Responds immediately with the task id; clients poll
/// `/api/status/{task_id}` for progress.
#[instrument(skip(body, config, registry))]
pub async fn start_screenshot(
    body: web::Json<StartRequest>,
    config: web::Data<ApiConfig>,
    registry: web::Data<TaskRegistry>,
) -> impl Responder {
    let mode = match body.mode.as_str() {
        "single" => RunMode::Single,
        "entire" => RunMode::Site,
        "list" => RunMode::List,
        other => {
            warn!("Rejected unknown mode: {}", other);
            return HttpResponse::BadRequest().json(ErrorResponse::new(format!(
                "Unknown mode '{}': expected single, entire, or list",
                other
            )));
        }
    };

    let url = body.url.clone().unwrap_or_default().trim().to_string();
    let mut urls = Vec::new();

    if mode == RunMode::List {
        urls = normalize_url_list(body.urls.as_deref().unwrap_or(&[]));
        if urls.is_empty() {
            warn!("Rejected list request without valid URLs");
            return HttpResponse::BadRequest().json(ErrorResponse::new(
                "Provide at least one valid URL (http:// or https://) in the list",
            ));
        }
    } else if url.is_empty() {
        warn!("Rejected request without URL");
        return HttpResponse::BadRequest().json(ErrorResponse::new("URL is required"));
    } else if !url.starts_with("http://") && !url.starts_with("https://") {
        warn!("Rejected invalid URL (not http/https): {}", url);
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "Invalid URL: must start with http:// or https://",
        ));
    }

    let (task_id, handle) = registry.create().await;
    let output_dir = config.screenshot_dir.join(task_id.to_string());
    if let Err(e) = fs::create_dir_all(&output_dir) {
        error!("Failed to create output directory {}: {}", output_dir.display(), e);
        // The run never starts; the task must not stay in the running state
        let message = format!("Failed to create output directory: {}", e);
        handle.fail(message.clone(), 0).await;
        return HttpResponse::InternalServerError().json(ErrorResponse::new(message));
    }

    let mut capture = config.capture.clone();
    if let Some(wait) = body.wait_time {
        capture.wait_time = Duration::from_secs(wait);
    }

    let request = RunRequest {
        mode,
        input: url,
        urls,
        output_dir: output_dir.clone(),
        capture,
        start_from: body.start_from.unwrap_or(0),
        max_pages: body.max_pages,
    };

    info!("Starting task {} (mode {:?})", task_id, mode);
    let log = RunLog::for_task(handle.clone());
    tokio::spawn(async move {
        let result = runner::execute(request, log.clone()).await;
        let count = count_screenshots(&output_dir);
        match result {
            Ok(summary) => {
                debug!("Task finished: {:?}", summary);
                handle.finish(count).await;
            }
            Err(e) => {
                let message = format!("{:#}", e);
                log.line(format!("Error: {}", message)).await;
                handle.fail(message, count).await;
            }
        }
    });

    HttpResponse::Ok().json(StartResponse {
        task_id,
        status: "started".to_string(),
        output_dir: task_id.to_string(),
    })
}

/// Returns the status of a screenshot run
#[instrument(skip(registry))]
pub async fn get_status(
    task_id: web::Path<String>,
    registry: web::Data<TaskRegistry>,
) -> impl Responder {
    let task_id = task_id.into_inner();
    let Some(handle) = lookup_task(registry.get_ref(), &task_id).await else {
        return HttpResponse::NotFound().json(ErrorResponse::new("Task not found"));
    };

    let snap = handle.snapshot(STATUS_TAIL_LINES).await;
    HttpResponse::Ok().json(StatusResponse {
        status: snap.status,
        output: snap.output,
        screenshot_count: snap.screenshot_count,
        error: snap.error,
    })
}

/// Returns the full run log as a plain-text download
#[instrument(skip(registry))]
pub async fn get_log(
    task_id: web::Path<String>,
    registry: web::Data<TaskRegistry>,
) -> impl Responder {
    let task_id = task_id.into_inner();
    let Some(handle) = lookup_task(registry.get_ref(), &task_id).await else {
        return HttpResponse::NotFound().json(ErrorResponse::new("Task not found"));
    };

    let text = handle.log_text().await;
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=screenshot_log_{}.txt", task_id),
        ))
        .body(text)
}

/// Lists the screenshots a task has produced so far
#[instrument(skip(config))]
pub async fn list_screenshots(
    task_id: web::Path<String>,
    config: web::Data<ApiConfig>,
) -> impl Responder {
    let task_id = task_id.into_inner();
    let Some(dir) = task_dir(config.get_ref(), &task_id) else {
        return HttpResponse::NotFound().json(ErrorResponse::new("Task directory not found"));
    };

    let screenshots = png_entries(&dir)
        .into_iter()
        .map(|(filename, size)| ScreenshotEntry { filename, size })
        .collect();
    HttpResponse::Ok().json(ScreenshotList { screenshots })
}

/// Serves a single screenshot inline
#[instrument(skip(config))]
pub async fn get_screenshot(
    path: web::Path<(String, String)>,
    config: web::Data<ApiConfig>,
) -> impl Responder {
    let (task_id, filename) = path.into_inner();
    serve_png(config.get_ref(), &task_id, &filename, false)
}

/// Serves a single screenshot as a download
#[instrument(skip(config))]
pub async fn download_screenshot(
    path: web::Path<(String, String)>,
    config: web::Data<ApiConfig>,
) -> impl Responder {
    let (task_id, filename) = path.into_inner();
    serve_png(config.get_ref(), &task_id, &filename, true)
}

/// Bundles every screenshot of a task into a zip download
#[instrument(skip(config))]
pub async fn download_all(
    task_id: web::Path<String>,
    config: web::Data<ApiConfig>,
) -> impl Responder {
    let task_id = task_id.into_inner();
    let Some(dir) = task_dir(config.get_ref(), &task_id) else {
        return HttpResponse::NotFound().json(ErrorResponse::new("Task directory not found"));
    };

    let pngs = png_entries(&dir);
    if pngs.is_empty() {
        return HttpResponse::NotFound().json(ErrorResponse::new("No screenshots found"));
    }

    let zip_path = config.screenshot_dir.join(format!("{}.zip", task_id));
    match build_zip(&dir, &pngs, &zip_path) {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("application/zip")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=screenshots_{}.zip", task_id),
            ))
            .body(bytes),
        Err(e) => {
            error!("Failed to create zip for task {}: {:#}", task_id, e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new(format!("Failed to create zip file: {}", e)))
        }
    }
}

async fn lookup_task(
    registry: &TaskRegistry,
    task_id: &str,
) -> Option<std::sync::Arc<crate::tasks::TaskHandle>> {
    let id = Uuid::parse_str(task_id).ok()?;
    registry.get(&id).await
}

/// Resolves a task's directory, rejecting ids that are not UUIDs (which
/// also rules out any path traversal) and directories that do not exist.
fn task_dir(config: &ApiConfig, task_id: &str) -> Option<PathBuf> {
    let id = Uuid::parse_str(task_id).ok()?;
    let dir = config.screenshot_dir.join(id.to_string());
    dir.is_dir().then_some(dir)
}

/// Only plain PNG filenames may be served, matching what `png_entries`
/// lists; anything else (other extensions, separators, `..`) is rejected.
fn is_servable_filename(name: &str) -> bool {
    name.ends_with(".png") && !name.contains('/') && !name.contains('\\') && !name.contains("..")
}

fn serve_png(config: &ApiConfig, task_id: &str, filename: &str, attachment: bool) -> HttpResponse {
    let Some(dir) = task_dir(config, task_id) else {
        return HttpResponse::NotFound().json(ErrorResponse::new("Task directory not found"));
    };
    if !is_servable_filename(filename) {
        return HttpResponse::NotFound().json(ErrorResponse::new("File not found"));
    }

    let file_path = dir.join(filename);
    let bytes = match fs::read(&file_path) {
        Ok(bytes) => bytes,
        Err(_) => {
            return HttpResponse::NotFound().json(ErrorResponse::new("File not found"));
        }
    };

    let mut response = HttpResponse::Ok();
    response.content_type("image/png");
    if attachment {
        response.insert_header((
            "Content-Disposition",
            format!("attachment; filename={}", filename),
        ));
    }
    response.body(bytes)
}

/// Sorted (filename, size) pairs for every PNG in a directory.
fn png_entries(dir: &Path) -> Vec<(String, u64)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut pngs: Vec<(String, u64)> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(".png") {
                return None;
            }
            let size = entry.metadata().ok()?.len();
            Some((name, size))
        })
        .collect();
    pngs.sort();
    pngs
}

/// Number of PNGs a run produced, for the completion status.
pub fn count_screenshots(dir: &Path) -> usize {
    png_entries(dir).len()
}

fn build_zip(dir: &Path, pngs: &[(String, u64)], zip_path: &Path) -> anyhow::Result<Vec<u8>> {
    let file = fs::File::create(zip_path)?;
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for (name, _) in pngs {
        writer.start_file(name, options)?;
        writer.write_all(&fs::read(dir.join(name))?)?;
    }
    writer.finish()?;

    Ok(fs::read(zip_path)?)
}
