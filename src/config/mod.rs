//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (MONGO_DB / SESSION_SECRET / APP_ENV / BIND_ADDRESS overrides)
//!     → validation.rs (semantic checks)
//!     → Settings (validated, immutable)
//!     → shared via Arc with the bootstrapper and the pipeline
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; nothing reads the environment afterwards
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::DatabaseConfig;
pub use schema::Environment;
pub use schema::SessionConfig;
pub use schema::Settings;
