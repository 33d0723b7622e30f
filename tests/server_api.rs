//! Router tests driven through a scripted in-process engine (no Chrome needed)

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use pagestyle::analyzer::PageStyleExtractor;
use pagestyle::style::{COLOR_SCRIPT, FONT_SCRIPT};
use pagestyle::{Engine, EngineConfig, Error, Launch, Result, ScriptResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

#[derive(Clone, Default)]
struct Counters {
    launched: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

/// Serves canned script payloads; the host of the URL picks the failure mode.
struct ScriptedEngine {
    fonts: String,
    colors: String,
    url: String,
    counters: Counters,
}

impl Engine for ScriptedEngine {
    fn new(_config: EngineConfig) -> Result<Self> {
        Err(Error::ConfigError("use ScriptedLauncher".into()))
    }

    fn load_url(&mut self, url: &str) -> Result<()> {
        if url.contains("unreachable.test") {
            return Err(Error::LoadError("net::ERR_NAME_NOT_RESOLVED".into()));
        }
        if url.contains("slow.test") {
            std::thread::sleep(Duration::from_millis(400));
        }
        self.url = url.to_string();
        Ok(())
    }

    fn evaluate_script_in_page(&mut self, script: &str) -> Result<ScriptResult> {
        let value = if script == FONT_SCRIPT {
            self.fonts.clone()
        } else if script == COLOR_SCRIPT {
            self.colors.clone()
        } else {
            return Err(Error::ScriptError("unexpected script".into()));
        };
        Ok(ScriptResult { value, is_error: false })
    }

    fn current_url(&self) -> String {
        self.url.clone()
    }

    fn close(self) -> Result<()> {
        Ok(())
    }
}

impl Drop for ScriptedEngine {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

struct ScriptedLauncher {
    fonts: String,
    colors: String,
    fail_launch: bool,
    counters: Counters,
}

impl ScriptedLauncher {
    fn new(fonts: &str, colors: &str) -> Self {
        Self {
            fonts: fonts.to_string(),
            colors: colors.to_string(),
            fail_launch: false,
            counters: Counters::default(),
        }
    }
}

impl Launch for ScriptedLauncher {
    type Engine = ScriptedEngine;

    fn launch(&self) -> Result<ScriptedEngine> {
        if self.fail_launch {
            return Err(Error::InitializationError("Could not auto detect a chrome executable".into()));
        }
        self.counters.launched.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedEngine {
            fonts: self.fonts.clone(),
            colors: self.colors.clone(),
            url: String::new(),
            counters: self.counters.clone(),
        })
    }
}

fn app(launcher: ScriptedLauncher) -> (Router, Counters) {
    let counters = launcher.counters.clone();
    let extractor = PageStyleExtractor::new(launcher).with_timeout_ms(5000);
    (pagestyle::server::router(extractor, None), counters)
}

fn analyze_request(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn wait_for_release(counters: &Counters, expected: usize) {
    for _ in 0..200 {
        if counters.released.load(Ordering::SeqCst) >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("browser was not released");
}

const RED_ON_BLUE: &str = r#"[
    {"color":"rgb(255, 0, 0)","background":"rgb(0, 0, 255)","opacity":"1","display":"block","visibility":"visible","className":""},
    {"color":"rgb(255, 0, 0)","background":"rgba(0, 0, 0, 0)","opacity":"1","display":"inline","visibility":"visible","className":"lead"}
]"#;

#[tokio::test]
async fn analyze_returns_fonts_and_colors() {
    let (app, counters) = app(ScriptedLauncher::new(r#"["Arial, sans-serif"]"#, RED_ON_BLUE));

    let (status, json) = send(app, analyze_request(r#"{"url":"http://fixture.test/"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["url"], "http://fixture.test/");
    assert_eq!(json["fonts"], serde_json::json!([{ "name": "Arial", "family": "Arial, sans-serif" }]));
    assert_eq!(json["colors"], serde_json::json!(["#ff0000", "#0000ff"]));
    assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    assert_eq!(counters.launched.load(Ordering::SeqCst), 1);
    assert_eq!(counters.released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn icon_and_generic_styles_are_filtered() {
    let colors = r#"[
        {"color":"rgb(0, 0, 0)","background":"rgb(12, 200, 90)","opacity":"1","display":"block","visibility":"visible","className":"icon-social"},
        {"color":"rgb(0, 0, 0)","background":"rgba(0, 0, 0, 0)","opacity":"1","display":"block","visibility":"visible","className":""}
    ]"#;
    let (app, _) = app(ScriptedLauncher::new(r#"["serif"]"#, colors));

    let (status, json) = send(app, analyze_request(r#"{"url":"http://fixture.test/"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["fonts"], serde_json::json!([]));
    assert_eq!(json["colors"], serde_json::json!([]));
}

#[tokio::test]
async fn colors_never_exceed_four() {
    let colors = r#"[
        {"color":"rgb(1, 1, 1)","background":"rgb(2, 2, 2)","opacity":"1","display":"block","visibility":"visible","className":""},
        {"color":"rgb(3, 3, 3)","background":"rgb(4, 4, 4)","opacity":"1","display":"block","visibility":"visible","className":""},
        {"color":"rgb(5, 5, 5)","background":"rgb(6, 6, 6)","opacity":"1","display":"block","visibility":"visible","className":""}
    ]"#;
    let (app, _) = app(ScriptedLauncher::new("[]", colors));

    let (status, json) = send(app, analyze_request(r#"{"url":"https://fixture.test/"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["colors"], serde_json::json!(["#010101", "#020202", "#030303", "#040404"]));
}

#[tokio::test]
async fn malformed_url_is_rejected_before_launch() {
    let (app, counters) = app(ScriptedLauncher::new("[]", "[]"));

    let (status, json) = send(app, analyze_request(r#"{"url":"not a url"}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
    assert_eq!(counters.launched.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_or_unparsable_body_is_rejected() {
    for body in [r#"{}"#, r#"{"url": 42}"#, "not json", r#"{"url":"file:///etc/passwd"}"#] {
        let (app, counters) = app(ScriptedLauncher::new("[]", "[]"));
        let (status, json) = send(app, analyze_request(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
        assert!(json["error"].is_string(), "body {body:?}");
        assert_eq!(counters.launched.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn missing_content_type_is_rejected() {
    let (app, _) = app(ScriptedLauncher::new("[]", "[]"));
    let req = Request::builder()
        .method(Method::POST)
        .uri("/analyze")
        .body(Body::from(r#"{"url":"http://fixture.test/"}"#))
        .unwrap();

    let (status, json) = send(app, req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn navigation_failure_releases_the_browser() {
    let (app, counters) = app(ScriptedLauncher::new("[]", "[]"));

    let (status, json) = send(app, analyze_request(r#"{"url":"http://unreachable.test/"}"#)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "Failed to load the requested page");
    assert_eq!(counters.launched.load(Ordering::SeqCst), 1);
    assert_eq!(counters.released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn bad_script_payload_is_an_internal_error() {
    let (app, counters) = app(ScriptedLauncher::new("{\"not\":\"a list\"}", "[]"));

    let (status, json) = send(app, analyze_request(r#"{"url":"http://fixture.test/"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].is_string());
    assert_eq!(counters.released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn launch_failure_is_service_unavailable() {
    let mut launcher = ScriptedLauncher::new("[]", "[]");
    launcher.fail_launch = true;
    let (app, _) = app(launcher);

    let (status, json) = send(app, analyze_request(r#"{"url":"http://fixture.test/"}"#)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"], "Browser is unavailable");
}

#[tokio::test]
async fn deadline_exceeded_times_out_and_releases() {
    let launcher = ScriptedLauncher::new("[]", "[]");
    let counters = launcher.counters.clone();
    let extractor = PageStyleExtractor::new(launcher).with_timeout_ms(100);
    let app = pagestyle::server::router(extractor, None);

    let (status, json) = send(app, analyze_request(r#"{"url":"http://slow.test/"}"#)).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(json["error"].as_str().unwrap().contains("timed out"));
    wait_for_release(&counters, 1).await;
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let (app, _) = app(ScriptedLauncher::new("[]", "[]"));
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/analyze")
        .header(header::ORIGIN, "https://somewhere.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();

    assert!(resp.status().is_success());
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn static_files_are_served_when_configured() {
    let dir = std::env::temp_dir().join(format!("pagestyle-static-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>pagestyle</h1>").unwrap();

    let extractor = PageStyleExtractor::new(ScriptedLauncher::new("[]", "[]"));
    let app = pagestyle::server::router(extractor, Some(dir.as_path()));
    let req = Request::builder().uri("/index.html").body(Body::empty()).unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
    assert_eq!(&body[..], b"<h1>pagestyle</h1>");

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn unknown_route_returns_404_without_static_dir() {
    let (app, _) = app(ScriptedLauncher::new("[]", "[]"));
    let req = Request::builder().uri("/nonexistent").body(Body::empty()).unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
