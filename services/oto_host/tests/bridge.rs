use async_trait::async_trait;
use oto_db::SqliteBinding;
use oto_env::http::StatusCode;
use oto_env::{
    EdgeError, Env, EnvFlags, ExecutionContext, FetchHandler, StorageError, WorkerRequest,
    WorkerResponse,
};
use oto_store::DirBucket;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;

/// Scripted routes that poke each bridge path in turn.
struct BridgeProbe;

#[async_trait]
impl FetchHandler for BridgeProbe {
    async fn fetch(
        &self,
        req: WorkerRequest,
        _env: &Env,
        ctx: &ExecutionContext,
    ) -> Result<WorkerResponse, EdgeError> {
        match req.path() {
            "/echo" => Ok(WorkerResponse::json(&json!({
                "method": req.method().as_str(),
                "url": req.url().as_str(),
                "term": req.query("term"),
                "pairs": req
                    .query_pairs()
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>(),
                "x_probe": req.header("x-probe"),
                "body": String::from_utf8_lossy(req.body()),
            }))),
            "/teapot" => Ok(WorkerResponse::text("short and stout")
                .with_status(StatusCode::IM_A_TEAPOT)
                .with_header("x-custom", "42")
                .with_header("content-length", "999")),
            "/bad-json" => {
                Ok(WorkerResponse::text("{nope").with_header("content-type", "application/json"))
            }
            "/audio-bytes" => Ok(WorkerResponse::audio(vec![0xff, 0xfb, 0x90, 0x00])),
            "/missing" => Err(EdgeError::from(StorageError::NotFound {
                key: "jpod_files/x.mp3".into(),
            })),
            "/explode" => Err(EdgeError::internal("router exploded")),
            "/panic" => panic!("deliberate router panic"),
            "/defer-fail" => {
                ctx.suppress_fatal_propagation();
                ctx.defer_until_settled(async {
                    Err(EdgeError::internal("background write failed"))
                });
                Ok(WorkerResponse::json(&json!({ "queued": true })))
            }
            _ => Ok(WorkerResponse::json(&json!({ "message": "Not Found" }))
                .with_status(StatusCode::NOT_FOUND)),
        }
    }
}

async fn setup() -> (String, Client, tempfile::TempDir, tokio::task::JoinHandle<()>) {
    let dir = tempfile::tempdir().unwrap();
    let db = SqliteBinding::open_in_memory().unwrap();
    let env = Env::new(
        Arc::new(db),
        Arc::new(DirBucket::new(dir.path())),
        EnvFlags::default(),
    );
    let (addr, handle) = oto_host::test::spawn(env, Arc::new(BridgeProbe)).await;
    (format!("http://{addr}"), Client::new(), dir, handle)
}

// ── Inbound fidelity ─────────────────────────────────────────────

#[tokio::test]
async fn echo_sees_method_url_query_headers_and_body() {
    let (base, http, _d, _h) = setup().await;
    let seen: Value = http
        .post(format!("{base}/echo?term=%E7%8C%AB&x=1&x=2"))
        .header("x-probe", "sushi")
        .body("payload bytes")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(seen["method"], "POST");
    assert!(seen["url"].as_str().unwrap().starts_with("http://127.0.0.1:"));
    assert_eq!(seen["term"], "猫");
    assert_eq!(seen["pairs"], json!(["term=猫", "x=1", "x=2"]));
    assert_eq!(seen["x_probe"], "sushi");
    assert_eq!(seen["body"], "payload bytes");
}

// ── Outbound fidelity ────────────────────────────────────────────

#[tokio::test]
async fn status_and_custom_headers_survive_framing_is_recomputed() {
    let (base, http, _d, _h) = setup().await;
    let resp = http.get(format!("{base}/teapot")).send().await.unwrap();
    assert_eq!(resp.status(), 418);
    assert_eq!(resp.headers()["x-custom"], "42");
    // The stale content-length was dropped and recomputed.
    assert_eq!(resp.headers()["content-length"], "15");
    assert_eq!(resp.text().await.unwrap(), "short and stout");
}

#[tokio::test]
async fn audio_bytes_pass_through_verbatim() {
    let (base, http, _d, _h) = setup().await;
    let resp = http.get(format!("{base}/audio-bytes")).send().await.unwrap();
    assert_eq!(resp.headers()["content-type"], "audio/mpeg");
    assert_eq!(resp.bytes().await.unwrap().as_ref(), &[0xff, 0xfb, 0x90, 0x00]);
}

#[tokio::test]
async fn broken_json_from_the_handler_is_a_bridge_500() {
    let (base, http, _d, _h) = setup().await;
    let resp = http.get(format!("{base}/bad-json")).send().await.unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert!(
        body["message"].as_str().unwrap().contains("json"),
        "body: {body}"
    );
}

#[tokio::test]
async fn cors_is_permissive() {
    let (base, http, _d, _h) = setup().await;
    let resp = http
        .get(format!("{base}/echo"))
        .header("origin", "http://example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
}

// ── Terminal error boundary ──────────────────────────────────────

#[tokio::test]
async fn absence_errors_map_to_404_with_message_body() {
    let (base, http, _d, _h) = setup().await;
    let resp = http.get(format!("{base}/missing")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "no such object: jpod_files/x.mp3");
}

#[tokio::test]
async fn handler_errors_map_to_500_with_message_body() {
    let (base, http, _d, _h) = setup().await;
    let resp = http.get(format!("{base}/explode")).send().await.unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "router exploded");
}

#[tokio::test]
async fn a_panicking_handler_yields_json_500_and_the_host_survives() {
    let (base, http, _d, _h) = setup().await;
    let resp = http.get(format!("{base}/panic")).send().await.unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert!(
        body["message"].as_str().unwrap().contains("deliberate router panic"),
        "body: {body}"
    );

    // The next exchange is served normally.
    let resp = http.get(format!("{base}/echo")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn deferred_failure_never_reaches_the_response() {
    let (base, http, _d, _h) = setup().await;
    let resp = http.get(format!("{base}/defer-fail")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["queued"], true);

    // And it does not poison later exchanges either.
    let resp = http.get(format!("{base}/echo")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn unrouted_paths_get_the_handler_404() {
    let (base, http, _d, _h) = setup().await;
    let resp = http.get(format!("{base}/nope")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Not Found");
}
