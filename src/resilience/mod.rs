//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Database operation (connect, session load/save/delete):
//!     → timeouts.rs (enforce the configured socket timeout)
//!     → On elapse: operation fails with a distinct timeout error
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries inside a request; a failed setup is retried by the next request

pub mod timeouts;
