//! Oto Env: the emulated edge environment contract.
//!
//! Everything a hosted router sees when it runs locally instead of on its
//! edge platform: relational and blob bindings, Fetch-shaped exchange
//! values, and a per-request execution context for deferred work.
//!
//! # Architecture
//!
//! ```text
//! HTTP server (axum)
//!   │
//!   ▼
//! WorkerRequest + Env { audio_db, audio_bucket, flags } + ExecutionContext
//!   │
//!   ▼
//! FetchHandler::fetch()            (the hosted router)
//!   │
//!   ▼
//! WorkerResponse → render_body() → HTTP response
//! ```
//!
//! The router never touches SQLite or the filesystem directly; it only
//! sees the binding traits. Backends live in their own crates and tests
//! substitute in-memory fakes.

pub mod blob;
pub mod ctx;
pub mod env;
pub mod error;
pub mod exchange;
pub mod handler;
pub mod sql;

// Exchange values are built from `http` and `url` types; re-exported so
// consumers name the same versions this crate was built against.
pub use http;
pub use url;

pub use blob::{BlobBinding, StoredObject, AUDIO_MPEG};
pub use ctx::ExecutionContext;
pub use env::{Env, EnvFlags};
pub use error::{BridgeError, EdgeError, QueryError, StorageError};
pub use exchange::{render_body, RenderedBody, WorkerRequest, WorkerResponse};
pub use handler::FetchHandler;
pub use sql::{Database, PreparedQuery, QueryEnvelope, QueryMeta, RelationalBinding, Row};
