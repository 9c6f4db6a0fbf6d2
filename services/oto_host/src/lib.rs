pub mod bridge;
pub mod lookup;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    Router,
};
use oto_env::{Env, FetchHandler};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub env: Env,
    pub handler: Arc<dyn FetchHandler>,
}

/// Build the host router around a hosted `handler`. Every path falls
/// through to the bridge; routing is the hosted router's business. No
/// request deadline and no body cap are imposed here.
pub fn app(env: Env, handler: Arc<dyn FetchHandler>) -> Router {
    let state = AppState { env, handler };
    Router::new()
        .fallback(bridge::handle)
        .layer(CatchPanicLayer::custom(bridge::panic_response))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Middleware: one line per exchange, before the bridge sees it.
async fn log_request(req: Request, next: Next) -> Response {
    info!("{} {}", req.method(), req.uri().path());
    next.run(req).await
}

pub mod test {
    use super::*;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    /// Spawn the host on a random port over the given environment and
    /// handler. Returns the address and a JoinHandle that keeps the
    /// server alive until dropped.
    pub async fn spawn(
        env: Env,
        handler: Arc<dyn FetchHandler>,
    ) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let app = app(env, handler);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, handle)
    }
}
