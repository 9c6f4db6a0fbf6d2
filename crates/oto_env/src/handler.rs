//! The seam between the host and the application it runs.

use crate::ctx::ExecutionContext;
use crate::env::Env;
use crate::error::EdgeError;
use crate::exchange::{WorkerRequest, WorkerResponse};
use async_trait::async_trait;

/// A hosted router. The host knows nothing else about the application:
/// one `fetch` call per bridged exchange, handed the request, the bindings
/// and the per-request context.
#[async_trait]
pub trait FetchHandler: Send + Sync {
    async fn fetch(
        &self,
        req: WorkerRequest,
        env: &Env,
        ctx: &ExecutionContext,
    ) -> Result<WorkerResponse, EdgeError>;
}
