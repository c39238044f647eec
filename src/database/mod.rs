//! Document database subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline setup:
//!     → DocumentStore::connect (no-op when already connected)
//!     → DocumentStore::session_store (TTL index ensured, store handed to the session layer)
//!
//! Status endpoint:
//!     → DocumentStore::connection_state
//!
//! Graceful shutdown:
//!     → DocumentStore::disconnect
//! ```
//!
//! # Design Decisions
//! - The bootstrapper only sees the `DocumentStore` capability, so tests inject fakes
//! - Connection state follows the driver's ready states; only `Connected` counts as up
//! - Credentials never reach the logs; only the host is recorded

pub mod mongo;
pub mod sessions;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tower::BoxError;

pub use mongo::MongoDatabase;
pub use sessions::{MongoSessionStore, SessionBackend};

/// Ready state of the database connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Connecting,
    Disconnecting,
}

impl ConnectionState {
    /// Label reported by the status endpoint.
    pub fn as_status(self) -> &'static str {
        match self {
            ConnectionState::Connected => "connected",
            _ => "disconnected",
        }
    }
}

/// Errors raised while talking to the document database.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database connection string is not set (MONGO_DB)")]
    MissingUri,

    #[error("invalid database connection string")]
    InvalidUri(#[source] BoxError),

    #[error("database is unreachable")]
    Unreachable(#[source] BoxError),

    #[error("database is not connected")]
    NotConnected,

    #[error("database operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Connection and session-storage capability required by the bootstrapper.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Establish the connection. Must be a no-op when already connected.
    async fn connect(&self) -> Result<(), DatabaseError>;

    fn connection_state(&self) -> ConnectionState;

    /// Server-side session storage backed by this database.
    async fn session_store(&self) -> Result<SessionBackend, DatabaseError>;

    /// Release the connection pool.
    async fn disconnect(&self) {}
}
