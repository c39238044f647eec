//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (server.rs) or Lambda event
//!     → bootstrap::Application::handle
//!     → pipeline.rs (CORS, request id, trace, error stage, limits, sessions, auth)
//!     → status.rs (/api/status) or registered routes
//!     → error.rs (JSON 500 for failures)
//!     → Send to client
//! ```

pub mod error;
pub mod pipeline;
pub mod request;
pub mod server;
pub mod status;

pub use error::{ApiError, ErrorBody};
pub use pipeline::AppState;
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
