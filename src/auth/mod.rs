//! Authentication wiring.
//!
//! # Data Flow
//! ```text
//! session cookie (signed)
//!     → session layer (loads the record lazily)
//!     → load_identity (user id in session → Identity extension)
//!     → handlers (Identity / TypedSession)
//! ```
//!
//! # Design Decisions
//! - Credential checks live in the route modules; this only resolves who is signed in
//! - The wiring is injected through `AuthSetup` so deployments can replace it

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::{self, Next},
    response::Response,
    Router,
};
use tower_sessions::session::Error as SessionError;
use tower_sessions::Session;

use crate::http::pipeline::AppState;

/// Installs authentication middleware on the pipeline.
///
/// Called once during setup, after the session layer is in place and before
/// the routes are served.
pub trait AuthSetup: Send + Sync + 'static {
    fn install(&self, router: Router<AppState>) -> Router<AppState>;
}

/// Session-backed identity resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionAuth;

impl AuthSetup for SessionAuth {
    fn install(&self, router: Router<AppState>) -> Router<AppState> {
        router.layer(middleware::from_fn(load_identity))
    }
}

/// The signed-in user, present in request extensions when the session has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}

async fn load_identity(session: TypedSession, mut request: Request, next: Next) -> Response {
    match session.get_user_id().await {
        Ok(Some(user_id)) => {
            request.extensions_mut().insert(Identity { user_id });
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load session identity");
        }
    }
    next.run(request).await
}

/// Typed view over the request's session.
pub struct TypedSession(Session);

impl TypedSession {
    const USER_ID_KEY: &'static str = "user_id";

    /// Issue a new session id, keeping the data. Call on privilege changes.
    pub async fn renew(&self) -> Result<(), SessionError> {
        self.0.cycle_id().await
    }

    pub async fn insert_user_id(&self, user_id: &str) -> Result<(), SessionError> {
        self.0.insert(Self::USER_ID_KEY, user_id).await
    }

    pub async fn get_user_id(&self) -> Result<Option<String>, SessionError> {
        self.0.get(Self::USER_ID_KEY).await
    }

    /// Drop the session data and its record.
    pub async fn log_out(&self) -> Result<(), SessionError> {
        self.0.flush().await
    }
}

impl<S> FromRequestParts<S> for TypedSession
where
    S: Send + Sync,
{
    type Rejection = <Session as FromRequestParts<S>>::Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Session::from_request_parts(parts, state).await.map(TypedSession)
    }
}
