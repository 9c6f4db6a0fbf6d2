//! Bundled lookup router: a minimal hosted application over the emulated
//! environment.
//!
//! Two routes, matching the public surface clients configure against:
//! - `GET /audio/list?term=&reading=` queries the entries table and
//!   returns an audio source list with absolute file URLs;
//! - `GET /audio/file/{source}/{file}` streams one stored audio object.
//!
//! Everything else is a JSON 404. The full production router can replace
//! this handler without touching the host.

use async_trait::async_trait;
use oto_env::http::StatusCode;
use oto_env::{
    Env, EdgeError, ExecutionContext, FetchHandler, Row, WorkerRequest, WorkerResponse,
};
use serde_json::{json, Value};

pub struct LookupHandler;

#[async_trait]
impl FetchHandler for LookupHandler {
    async fn fetch(
        &self,
        req: WorkerRequest,
        env: &Env,
        _ctx: &ExecutionContext,
    ) -> Result<WorkerResponse, EdgeError> {
        if req.method().as_str() == "GET" {
            if req.path() == "/audio/list" {
                return audio_list(&req, env).await;
            }
            if let Some(rest) = req.path().strip_prefix("/audio/file/") {
                return audio_file(rest, env).await;
            }
        }
        Ok(not_found("Not Found"))
    }
}

async fn audio_list(req: &WorkerRequest, env: &Env) -> Result<WorkerResponse, EdgeError> {
    let term = match req.query("term") {
        Some(term) if !term.is_empty() => term,
        _ => {
            return Ok(WorkerResponse::json(&json!({ "message": "term is required" }))
                .with_status(StatusCode::BAD_REQUEST))
        }
    };
    let reading = req.query("reading").filter(|r| !r.is_empty());

    let envelope = match reading {
        Some(reading) => {
            env.audio_db
                .prepare(
                    "SELECT expression, reading, source, file FROM entries \
                     WHERE expression = ?1 AND reading = ?2 ORDER BY source",
                )
                .bind(vec![json!(term), json!(reading)])
                .all()
                .await
        }
        None => {
            env.audio_db
                .prepare(
                    "SELECT expression, reading, source, file FROM entries \
                     WHERE expression = ?1 OR reading = ?1 ORDER BY source",
                )
                .bind(vec![json!(term)])
                .all()
                .await
        }
    };
    if !envelope.success {
        return Err(EdgeError::internal(
            envelope.error.unwrap_or_else(|| "query failed".into()),
        ));
    }

    let sources: Vec<Value> = envelope
        .results
        .iter()
        .filter_map(|row| audio_source(req, row))
        .collect();
    Ok(WorkerResponse::json(&json!({
        "type": "audioSourceList",
        "audioSources": sources,
    })))
}

/// One list entry. The file URL is rebuilt on the request's own origin so
/// the client can fetch it back through this host.
fn audio_source(req: &WorkerRequest, row: &Row) -> Option<Value> {
    let source = row.get("source")?.as_str()?;
    let file = row.get("file")?.as_str()?;
    let expression = row
        .get("expression")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let mut url = req.url().clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().extend(["audio", "file", source, file]);
    }
    url.set_query(None);

    Some(json!({
        "name": format!("{source} {expression}"),
        "url": url.as_str(),
    }))
}

async fn audio_file(rest: &str, env: &Env) -> Result<WorkerResponse, EdgeError> {
    let Some((source, file)) = split_segments(rest) else {
        return Ok(not_found("File not found"));
    };
    let key = format!("{source}_files/{file}");
    match env.audio_bucket.get(&key).await? {
        Some(obj) => Ok(WorkerResponse::audio(obj.into_bytes())),
        None => Ok(not_found("File not found")),
    }
}

/// Split `{source}/{file}` and percent-decode both halves. Keys that
/// cannot decode address nothing.
fn split_segments(rest: &str) -> Option<(String, String)> {
    let (source, file) = rest.split_once('/')?;
    if source.is_empty() || file.is_empty() {
        return None;
    }
    let source = urlencoding::decode(source).ok()?.into_owned();
    let file = urlencoding::decode(file).ok()?.into_owned();
    Some((source, file))
}

fn not_found(message: &str) -> WorkerResponse {
    WorkerResponse::json(&json!({ "message": message })).with_status(StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oto_env::http::{HeaderMap, Method};
    use oto_env::{BlobBinding, EnvFlags, QueryError, RelationalBinding, StorageError, StoredObject};
    use std::collections::HashMap;
    use std::sync::Arc;

    struct FakeDb {
        rows: Vec<Row>,
        fail: Option<String>,
    }

    #[async_trait]
    impl RelationalBinding for FakeDb {
        async fn query(&self, _text: &str, params: &[Value]) -> Result<Vec<Row>, QueryError> {
            if let Some(message) = &self.fail {
                return Err(QueryError::Failed(message.clone()));
            }
            let term = params[0].as_str().unwrap_or_default();
            Ok(self
                .rows
                .iter()
                .filter(|row| row["expression"] == json!(term))
                .cloned()
                .collect())
        }
    }

    struct FakeBucket {
        objects: HashMap<String, Vec<u8>>,
    }

    #[async_trait]
    impl BlobBinding for FakeBucket {
        async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
            Ok(self.objects.get(key).cloned().map(StoredObject::new))
        }

        async fn put(&self, _key: &str, _data: Vec<u8>) -> Result<(), StorageError> {
            Ok(())
        }
    }

    fn entry(expression: &str, reading: &str, source: &str, file: &str) -> Row {
        let mut row = Row::new();
        row.insert("expression".into(), json!(expression));
        row.insert("reading".into(), json!(reading));
        row.insert("source".into(), json!(source));
        row.insert("file".into(), json!(file));
        row
    }

    fn env(rows: Vec<Row>, fail: Option<String>, objects: HashMap<String, Vec<u8>>) -> Env {
        Env::new(
            Arc::new(FakeDb { rows, fail }),
            Arc::new(FakeBucket { objects }),
            EnvFlags::default(),
        )
    }

    fn get(url: &str) -> WorkerRequest {
        WorkerRequest::new(Method::GET, url, HeaderMap::new(), Vec::new()).unwrap()
    }

    async fn fetch(env: &Env, url: &str) -> Result<WorkerResponse, EdgeError> {
        LookupHandler
            .fetch(get(url), env, &ExecutionContext::new())
            .await
    }

    #[tokio::test]
    async fn list_builds_absolute_encoded_file_urls() {
        let env = env(
            vec![entry("猫", "ねこ", "jpod", "猫_ねこ.mp3")],
            None,
            HashMap::new(),
        );
        let resp = fetch(&env, "http://localhost:3000/audio/list?term=%E7%8C%AB")
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["type"], "audioSourceList");
        let url = body["audioSources"][0]["url"].as_str().unwrap();
        assert!(url.starts_with("http://localhost:3000/audio/file/jpod/"));
        assert!(!url.contains('?'));
        assert!(!url.contains('猫'), "path must be percent-encoded: {url}");
    }

    #[tokio::test]
    async fn list_without_term_is_a_400() {
        let env = env(Vec::new(), None, HashMap::new());
        let resp = fetch(&env, "http://localhost:3000/audio/list").await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["message"], "term is required");
    }

    #[tokio::test]
    async fn failed_envelope_propagates_the_driver_message() {
        let env = env(Vec::new(), Some("no such table: entries".into()), HashMap::new());
        let err = fetch(&env, "http://localhost:3000/audio/list?term=x")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no such table"));
    }

    #[tokio::test]
    async fn file_route_decodes_segments_and_streams_audio() {
        let mut objects = HashMap::new();
        objects.insert("jpod_files/猫_ねこ.mp3".to_string(), vec![1, 2, 3]);
        let env = env(Vec::new(), None, objects);
        let resp = fetch(
            &env,
            "http://localhost:3000/audio/file/jpod/%E7%8C%AB_%E3%81%AD%E3%81%93.mp3",
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.content_type(), Some("audio/mpeg"));
        assert_eq!(resp.body(), &[1, 2, 3]);
    }

    #[tokio::test]
    async fn missing_file_is_a_json_404() {
        let env = env(Vec::new(), None, HashMap::new());
        let resp = fetch(&env, "http://localhost:3000/audio/file/jpod/x.mp3")
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["message"], "File not found");
    }

    #[tokio::test]
    async fn unknown_routes_fall_through_to_404() {
        let env = env(Vec::new(), None, HashMap::new());
        let resp = fetch(&env, "http://localhost:3000/nope").await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
