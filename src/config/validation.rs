//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Validate addresses parse before anything binds them
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Settings → Result<(), Vec<ValidationError>>
//! - A missing database URI is not a validation error; it fails pipeline setup instead

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::Settings;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Check the configuration for semantic errors.
pub fn validate_config(settings: &Settings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: settings.listener.bind_address.clone(),
        });
    }

    if settings.database.name.trim().is_empty() {
        errors.push(ValidationError::Empty("database.name"));
    }
    if settings.database.server_selection_timeout_ms == 0 {
        errors.push(ValidationError::Zero("database.server_selection_timeout_ms"));
    }
    if settings.database.socket_timeout_ms == 0 {
        errors.push(ValidationError::Zero("database.socket_timeout_ms"));
    }

    if settings.session.secret.is_empty() {
        errors.push(ValidationError::Empty("session.secret"));
    }
    if settings.session.cookie_name.trim().is_empty() {
        errors.push(ValidationError::Empty("session.cookie_name"));
    }

    if settings.security.max_body_size == 0 {
        errors.push(ValidationError::Zero("security.max_body_size"));
    }

    if settings.observability.metrics_enabled
        && settings
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: settings.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
