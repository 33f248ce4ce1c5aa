//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, graceful shutdown)
//!     → pipeline.rs (request id, root span, metrics, request log, timeout)
//!     → handlers.rs (GET /store, /health, /, /metrics)
//!       graphql.rs  (POST /graphql)
//!     → resolver (cache-aside reads, CRUD)
//!     → error.rs (status + JSON error bodies)
//! ```

pub mod error;
pub mod graphql;
pub mod handlers;
pub mod pipeline;
pub mod request;
pub mod server;

pub use error::ApiError;
pub use request::X_REQUEST_ID;
pub use server::{build_router, AppState, HttpServer};
