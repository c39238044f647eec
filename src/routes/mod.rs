//! Delegated route registration.
//!
//! The service owns the pipeline; the application's route modules are
//! injected through [`RouteRegistry`] and registered once during setup.

use async_trait::async_trait;
use axum::Router;

use crate::http::pipeline::AppState;

/// Registers application routes on the pipeline.
#[async_trait]
pub trait RouteRegistry: Send + Sync + 'static {
    /// Add routes to `router`. An error aborts setup; the next request retries.
    async fn register(
        &self,
        router: Router<AppState>,
        state: &AppState,
    ) -> anyhow::Result<Router<AppState>>;
}

/// A prepared router is merged as-is.
#[async_trait]
impl RouteRegistry for Router<AppState> {
    async fn register(
        &self,
        router: Router<AppState>,
        _state: &AppState,
    ) -> anyhow::Result<Router<AppState>> {
        Ok(router.merge(self.clone()))
    }
}
