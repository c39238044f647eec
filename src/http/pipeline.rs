//! Pipeline assembly.
//!
//! # Layer Order (outermost first)
//! ```text
//! CORS (mirror origin, credentials)
//!     → trace span (request id assigned by the entry router)
//!     → error stage (HandlerFailure → JSON 500)
//!     → panic catcher
//!     → body size limit
//!     → session layer (signed cookie, database store)
//!     → auth wiring
//!     → /api/status + registered routes
//! ```

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    middleware,
    routing::get,
    Router,
};
use sha2::{Digest, Sha512};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tower_sessions::cookie::time::Duration;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer};

use crate::auth::AuthSetup;
use crate::bootstrap::BootstrapError;
use crate::config::{SessionConfig, Settings};
use crate::database::sessions::SESSION_TTL_SECS;
use crate::database::{DocumentStore, SessionBackend};
use crate::http::error::{error_stage, panic_response};
use crate::http::request::make_request_span;
use crate::http::status::{self, STATUS_PATH};
use crate::routes::RouteRegistry;

/// State shared with every handler.
#[derive(Clone)]
pub struct AppState {
    pub database: Arc<dyn DocumentStore>,
    pub settings: Arc<Settings>,
}

/// Assemble the request pipeline around the given session store.
pub async fn build(
    state: AppState,
    sessions: SessionBackend,
    auth: &dyn AuthSetup,
    routes: &dyn RouteRegistry,
) -> Result<Router, BootstrapError> {
    let settings = state.settings.clone();

    let router = Router::new().route(STATUS_PATH, get(status::report));
    let router = routes
        .register(router, &state)
        .await
        .map_err(BootstrapError::Registration)?;

    let router = auth
        .install(router)
        .layer(session_layer(sessions, &settings))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(settings.security.max_body_size))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(settings.clone(), error_stage))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(cors_layer())
        .with_state(state);

    Ok(router)
}

/// Any origin (mirrored, since credentials rule out `*`), common methods, credentials.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Session layer persisting into `store`; the record lives one day past last use.
pub fn session_layer(
    store: SessionBackend,
    settings: &Settings,
) -> SessionManagerLayer<SessionBackend, SignedCookie> {
    SessionManagerLayer::new(store)
        .with_name(settings.session.cookie_name.clone())
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(settings.environment.is_production())
        .with_expiry(Expiry::OnInactivity(Duration::seconds(SESSION_TTL_SECS)))
        .with_signed(signing_key(&settings.session))
}

/// Cookie signing key derived from the configured secret.
fn signing_key(session: &SessionConfig) -> Key {
    // SHA-512 output is exactly the 64 bytes `Key` requires.
    let digest = Sha512::digest(session.secret.as_bytes());
    Key::from(digest.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_key_is_stable() {
        let session = SessionConfig::default();
        assert_eq!(
            signing_key(&session).master(),
            signing_key(&session).master()
        );

        let other = SessionConfig {
            secret: "another-secret".into(),
            ..SessionConfig::default()
        };
        assert_ne!(signing_key(&session).master(), signing_key(&other).master());
    }
}
