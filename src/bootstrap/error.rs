use thiserror::Error;

use crate::database::DatabaseError;

/// Reasons the request pipeline could not be built.
///
/// None of these poison the application: the next request tries again.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("could not reach the database")]
    Connectivity(#[from] DatabaseError),

    #[error("route registration failed")]
    Registration(#[source] anyhow::Error),
}

impl BootstrapError {
    /// Label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            BootstrapError::Configuration(_) => "configuration",
            BootstrapError::Connectivity(_) => "connectivity",
            BootstrapError::Registration(_) => "registration",
        }
    }
}
