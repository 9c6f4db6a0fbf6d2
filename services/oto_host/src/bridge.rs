//! The exchange bridge: raw HTTP in, one Fetch-shaped exchange through the
//! hosted router, raw HTTP out.
//!
//! Terminal failure shape is always `{ "message": ... }` JSON carrying the
//! error's status. A failed exchange never takes the host down; the next
//! request is served normally.

use crate::AppState;
use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use oto_env::{
    render_body, BridgeError, ExecutionContext, RenderedBody, WorkerRequest, WorkerResponse,
};
use serde_json::json;
use std::any::Any;
use tracing::error;

/// Fallback for every route: bridge the exchange end to end.
pub async fn handle(State(state): State<AppState>, req: Request) -> Response {
    let worker_req = match inbound(req).await {
        Ok(req) => req,
        Err(err) => {
            error!("{err}");
            return message_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string());
        }
    };

    let ctx = ExecutionContext::new();
    match state.handler.fetch(worker_req, &state.env, &ctx).await {
        Ok(resp) => match outbound(resp) {
            Ok(resp) => resp,
            Err(err) => {
                error!("{err}");
                message_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
            }
        },
        Err(err) => {
            error!("{err}");
            message_response(err.http_status(), &err.to_string())
        }
    }
}

/// Inbound leg. The exchange URL is rebuilt as absolute from the Host
/// header, falling back to `localhost`; headers move over verbatim and
/// the body is collected whole.
async fn inbound(req: Request) -> Result<WorkerRequest, BridgeError> {
    let (parts, body) = req.into_parts();
    let host = parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("http://{host}{target}");
    let body = to_bytes(body, usize::MAX)
        .await
        .map_err(|e| BridgeError::Inbound(format!("read body: {e}")))?;
    WorkerRequest::new(parts.method, &url, parts.headers, body.to_vec())
}

/// Outbound leg. Status and headers copy verbatim except the framing
/// pair, which the server recomputes for the re-encoded body.
fn outbound(resp: WorkerResponse) -> Result<Response, BridgeError> {
    let content_type = resp.content_type().map(str::to_owned);
    let (status, mut headers, body) = resp.into_parts();
    headers.remove(header::CONTENT_LENGTH);
    headers.remove(header::TRANSFER_ENCODING);

    let body = match render_body(content_type.as_deref(), body)? {
        RenderedBody::Json(bytes) => Body::from(bytes),
        RenderedBody::Binary(bytes) => Body::from(bytes),
        RenderedBody::Text(text) => Body::from(text),
    };

    let mut out = Response::new(body);
    *out.status_mut() = status;
    *out.headers_mut() = headers;
    Ok(out)
}

fn message_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

/// Terminal panic boundary. Renders the same `{message}` JSON shape as
/// the error path, so a panicking handler still yields a well-formed 500.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Internal Server Error".to_string()
    };
    error!("handler panicked: {message}");
    message_response(StatusCode::INTERNAL_SERVER_ERROR, &message)
}
