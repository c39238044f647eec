//! Request pipeline bootstrapper.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → Application::handle
//!         OPTIONS → 200, empty body (pipeline untouched)
//!         otherwise → Application::pipeline
//!             ready → cached Router
//!             cold  → connect database (unless connected)
//!                   → session store
//!                   → http::pipeline::build (layers, auth, status, routes)
//!                   → cache (only on success)
//!             failed → JSON 500, retried on the next request
//!     → Router (oneshot)
//! ```
//!
//! # Design Decisions
//! - One explicit `Application` value replaces process-wide globals
//! - The once-cell is both the handle and the ready flag, so they cannot disagree
//! - Concurrent cold starts are serialized; only one build runs at a time

mod application;
mod error;

pub use application::{Application, ApplicationBuilder};
pub use error::BootstrapError;
