//! Lazily bootstrapped HTTP API backed by MongoDB sessions.

// Core subsystems
pub mod bootstrap;
pub mod config;
pub mod database;
pub mod http;

// Injected collaborators
pub mod auth;
pub mod routes;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use bootstrap::{Application, BootstrapError};
pub use config::Settings;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
