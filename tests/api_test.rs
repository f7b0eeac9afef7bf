use actix_web::{middleware, test, web, App};
use serde_json::{json, Value};
use uuid::Uuid;

use sitesnap::api::{routes, ApiConfig};
use sitesnap::capture::CaptureConfig;
use sitesnap::tasks::TaskRegistry;

fn test_config(dir: &tempfile::TempDir) -> ApiConfig {
    ApiConfig {
        screenshot_dir: dir.path().to_path_buf(),
        capture: CaptureConfig::default(),
    }
}

macro_rules! test_app {
    ($config:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($config))
                .app_data(web::Data::new(TaskRegistry::new()))
                .wrap(middleware::DefaultHeaders::new().add(("Access-Control-Allow-Origin", "*")))
                .configure(routes),
        )
        .await
    };
}

#[actix_web::test]
async fn dashboard_is_served_at_root() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(test_config(&dir));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert!(resp.status().is_success());

    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/html"));
}

#[actix_web::test]
async fn health_reports_running_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(test_config(&dir));

    let body: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/health").to_request())
            .await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["running_tasks"], 0);
}

#[actix_web::test]
async fn start_requires_a_url() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(test_config(&dir));

    let req = test::TestRequest::post()
        .uri("/api/screenshot")
        .set_json(json!({ "mode": "single" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn start_rejects_non_http_urls() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(test_config(&dir));

    let req = test::TestRequest::post()
        .uri("/api/screenshot")
        .set_json(json!({ "url": "file:///etc/passwd" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn start_rejects_unknown_modes() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(test_config(&dir));

    let req = test::TestRequest::post()
        .uri("/api/screenshot")
        .set_json(json!({ "url": "https://example.com", "mode": "bulk" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn list_mode_requires_valid_urls() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(test_config(&dir));

    let req = test::TestRequest::post()
        .uri("/api/screenshot")
        .set_json(json!({ "mode": "list", "urls": ["ftp://nope", "not-a-url"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "error");
}

#[actix_web::test]
async fn start_creates_a_pollable_task() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(test_config(&dir));

    let req = test::TestRequest::post()
        .uri("/api/screenshot")
        .set_json(json!({ "url": "https://example.com", "mode": "single" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "started");

    let task_id = body["task_id"].as_str().expect("task_id missing");
    assert_eq!(body["output_dir"], task_id);
    assert!(dir.path().join(task_id).is_dir());

    // The run itself will fail (no WebDriver in tests), but the task must
    // be visible to the status endpoint immediately
    let status: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/status/{}", task_id))
            .to_request(),
    )
    .await;
    let state = status["status"].as_str().unwrap_or_default();
    assert!(matches!(state, "running" | "completed" | "error"), "unexpected status {state}");
}

#[actix_web::test]
async fn failed_directory_creation_does_not_leak_a_running_task() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file where the screenshots root should go makes
    // create_dir_all fail for every task directory
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let config = ApiConfig {
        screenshot_dir: blocker.join("screenshots"),
        capture: CaptureConfig::default(),
    };
    let app = test_app!(config);

    let req = test::TestRequest::post()
        .uri("/api/screenshot")
        .set_json(json!({ "url": "https://example.com", "mode": "single" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 500);

    let health: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/health").to_request())
            .await;
    assert_eq!(health["running_tasks"], 0);
}

#[actix_web::test]
async fn status_of_unknown_task_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(test_config(&dir));

    let req = test::TestRequest::get()
        .uri(&format!("/api/status/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let req = test::TestRequest::get()
        .uri("/api/status/not-a-uuid")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn log_of_unknown_task_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(test_config(&dir));

    let req = test::TestRequest::get()
        .uri(&format!("/api/log/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn screenshots_are_listed_sorted_with_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let task_id = Uuid::new_v4();
    let task_dir = dir.path().join(task_id.to_string());
    std::fs::create_dir_all(&task_dir).unwrap();
    std::fs::write(task_dir.join("b_page.png"), b"fake-png-b").unwrap();
    std::fs::write(task_dir.join("a_page.png"), b"fake-png-aa").unwrap();
    std::fs::write(task_dir.join("notes.txt"), b"ignored").unwrap();

    let app = test_app!(test_config(&dir));
    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/screenshots/{}", task_id))
            .to_request(),
    )
    .await;

    let shots = body["screenshots"].as_array().expect("screenshots array");
    assert_eq!(shots.len(), 2);
    assert_eq!(shots[0]["filename"], "a_page.png");
    assert_eq!(shots[0]["size"], 11);
    assert_eq!(shots[1]["filename"], "b_page.png");
}

#[actix_web::test]
async fn listing_unknown_task_directory_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(test_config(&dir));

    let req = test::TestRequest::get()
        .uri(&format!("/api/screenshots/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn serves_and_downloads_a_screenshot() {
    let dir = tempfile::tempdir().unwrap();
    let task_id = Uuid::new_v4();
    let task_dir = dir.path().join(task_id.to_string());
    std::fs::create_dir_all(&task_dir).unwrap();
    std::fs::write(task_dir.join("page.png"), b"fake-png").unwrap();

    let app = test_app!(test_config(&dir));

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/screenshots/{}/page.png", task_id))
            .to_request(),
    )
    .await;
    assert!(resp.status().is_success());
    let bytes = test::read_body(resp).await;
    assert_eq!(&bytes[..], b"fake-png");

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/download/{}/page.png", task_id))
            .to_request(),
    )
    .await;
    assert!(resp.status().is_success());
    let disposition = resp
        .headers()
        .get("content-disposition")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(disposition.contains("attachment"));
}

#[actix_web::test]
async fn missing_file_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let task_id = Uuid::new_v4();
    std::fs::create_dir_all(dir.path().join(task_id.to_string())).unwrap();

    let app = test_app!(test_config(&dir));
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/screenshots/{}/nope.png", task_id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn only_png_files_are_served() {
    let dir = tempfile::tempdir().unwrap();
    let task_id = Uuid::new_v4();
    let task_dir = dir.path().join(task_id.to_string());
    std::fs::create_dir_all(&task_dir).unwrap();
    std::fs::write(task_dir.join("notes.txt"), b"not an image").unwrap();

    let app = test_app!(test_config(&dir));
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/screenshots/{}/notes.txt", task_id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn path_traversal_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let task_id = Uuid::new_v4();
    std::fs::create_dir_all(dir.path().join(task_id.to_string())).unwrap();
    std::fs::write(dir.path().join("secret.png"), b"secret").unwrap();

    let app = test_app!(test_config(&dir));
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/screenshots/{}/..%2Fsecret.png", task_id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn download_all_returns_a_zip() {
    let dir = tempfile::tempdir().unwrap();
    let task_id = Uuid::new_v4();
    let task_dir = dir.path().join(task_id.to_string());
    std::fs::create_dir_all(&task_dir).unwrap();
    std::fs::write(task_dir.join("one.png"), b"fake-png-1").unwrap();
    std::fs::write(task_dir.join("two.png"), b"fake-png-2").unwrap();

    let app = test_app!(test_config(&dir));
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/download-all/{}", task_id))
            .to_request(),
    )
    .await;
    assert!(resp.status().is_success());

    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert_eq!(content_type, "application/zip");

    // Zip archives start with the PK local-file-header signature
    let bytes = test::read_body(resp).await;
    assert_eq!(&bytes[..2], b"PK");
}

#[actix_web::test]
async fn download_all_without_screenshots_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let task_id = Uuid::new_v4();
    std::fs::create_dir_all(dir.path().join(task_id.to_string())).unwrap();

    let app = test_app!(test_config(&dir));
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/download-all/{}", task_id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn cors_header_is_present() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(test_config(&dir));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
