//! The application singleton and its entry point.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::sync::OnceCell;
use tower::ServiceExt;

use crate::auth::{AuthSetup, SessionAuth};
use crate::bootstrap::BootstrapError;
use crate::config::Settings;
use crate::database::{ConnectionState, DatabaseError, DocumentStore, MongoDatabase};
use crate::http::error::{error_chain, internal_error};
use crate::http::pipeline::{self, AppState};
use crate::http::request::{propagate_request_id, set_request_id};
use crate::observability::metrics;
use crate::routes::RouteRegistry;

/// Owns the lazily built request pipeline.
///
/// The pipeline is built by the first request that needs it and reused for
/// every request after that. Concurrent first requests wait for a single
/// build; a failed build leaves nothing behind, so a later request retries.
pub struct Application {
    settings: Arc<Settings>,
    database: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthSetup>,
    routes: Arc<dyn RouteRegistry>,
    pipeline: OnceCell<Router>,
}

impl Application {
    /// MongoDB-backed application with default auth wiring and no extra routes.
    pub fn new(settings: Settings) -> Self {
        Self::builder(settings).build()
    }

    pub fn builder(settings: Settings) -> ApplicationBuilder {
        ApplicationBuilder {
            settings,
            database: None,
            auth: None,
            routes: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn database(&self) -> &Arc<dyn DocumentStore> {
        &self.database
    }

    /// Whether the pipeline has been built.
    pub fn is_ready(&self) -> bool {
        self.pipeline.initialized()
    }

    /// The request pipeline, building it on first use.
    pub async fn pipeline(&self) -> Result<&Router, BootstrapError> {
        self.pipeline.get_or_try_init(|| self.initialize()).await
    }

    async fn initialize(&self) -> Result<Router, BootstrapError> {
        let started = Instant::now();
        tracing::info!("Building request pipeline");

        let result = self.assemble().await;
        match &result {
            Ok(_) => {
                tracing::info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Request pipeline ready"
                );
                metrics::record_bootstrap("ok", started);
            }
            Err(e) => {
                tracing::error!(
                    kind = e.kind(),
                    error = %error_chain(e),
                    "Request pipeline setup failed"
                );
                metrics::record_bootstrap(e.kind(), started);
            }
        }
        result
    }

    async fn assemble(&self) -> Result<Router, BootstrapError> {
        if self.settings.database.connection_string().is_none() {
            return Err(BootstrapError::Configuration(
                DatabaseError::MissingUri.to_string(),
            ));
        }

        if self.database.connection_state() != ConnectionState::Connected {
            self.database.connect().await?;
        }
        let sessions = self.database.session_store().await?;

        let state = AppState {
            database: self.database.clone(),
            settings: self.settings.clone(),
        };
        pipeline::build(state, sessions, self.auth.as_ref(), self.routes.as_ref()).await
    }

    /// Serve one request.
    ///
    /// `OPTIONS` is answered with an empty 200 without touching the pipeline.
    /// Setup failures become a JSON 500; nothing here panics or aborts.
    pub async fn handle(&self, request: Request) -> Response {
        let started = Instant::now();
        let method = request.method().clone();

        let response = if method == Method::OPTIONS {
            StatusCode::OK.into_response()
        } else {
            match self.pipeline().await {
                Ok(router) => match router.clone().oneshot(request).await {
                    Ok(response) => response,
                    Err(never) => match never {},
                },
                Err(e) => internal_error(self.settings.environment, e.to_string(), error_chain(&e)),
            }
        };

        metrics::record_request(method.as_str(), response.status().as_u16(), started);
        response
    }

    /// Router that sends every request through [`Application::handle`].
    ///
    /// Request IDs are assigned here so that preflight answers and setup
    /// failures carry one too.
    pub fn into_router(self: Arc<Self>) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(self)
            .layer(propagate_request_id())
            .layer(set_request_id())
    }

    /// Release the database connection.
    pub async fn shutdown(&self) {
        self.database.disconnect().await;
    }
}

async fn dispatch(State(app): State<Arc<Application>>, request: Request) -> Response {
    app.handle(request).await
}

pub struct ApplicationBuilder {
    settings: Settings,
    database: Option<Arc<dyn DocumentStore>>,
    auth: Option<Arc<dyn AuthSetup>>,
    routes: Option<Arc<dyn RouteRegistry>>,
}

impl ApplicationBuilder {
    pub fn database(mut self, database: Arc<dyn DocumentStore>) -> Self {
        self.database = Some(database);
        self
    }

    pub fn auth(mut self, auth: impl AuthSetup) -> Self {
        self.auth = Some(Arc::new(auth));
        self
    }

    pub fn routes(mut self, routes: impl RouteRegistry) -> Self {
        self.routes = Some(Arc::new(routes));
        self
    }

    pub fn build(self) -> Application {
        let database: Arc<dyn DocumentStore> = match self.database {
            Some(database) => database,
            None => Arc::new(MongoDatabase::new(self.settings.database.clone())),
        };
        let auth: Arc<dyn AuthSetup> = match self.auth {
            Some(auth) => auth,
            None => Arc::new(SessionAuth),
        };
        let routes: Arc<dyn RouteRegistry> = match self.routes {
            Some(routes) => routes,
            None => Arc::new(Router::<AppState>::new()),
        };

        Application {
            settings: Arc::new(self.settings),
            database,
            auth,
            routes,
            pipeline: OnceCell::new(),
        }
    }
}
