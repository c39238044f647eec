//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::Request,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, SessionStore};
use tower_sessions::MemoryStore;

use assessment_api::auth::{Identity, TypedSession};
use assessment_api::config::Settings;
use assessment_api::database::{ConnectionState, DatabaseError, DocumentStore, SessionBackend};
use assessment_api::http::{ApiError, AppState};
use assessment_api::{Application, HttpServer, Shutdown};

/// In-memory stand-in for the document database.
pub struct FakeDatabase {
    connects: AtomicUsize,
    reachable: AtomicBool,
    state: Mutex<ConnectionState>,
    connect_delay: Duration,
    sessions: SessionBackend,
}

impl FakeDatabase {
    pub fn new() -> Arc<Self> {
        Self::with_delay(Duration::ZERO)
    }

    /// `connect` takes `delay` before answering.
    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Self::build(delay, SessionBackend::new(MemoryStore::default()))
    }

    /// Hands the pipeline `store` instead of an in-memory one.
    pub fn with_sessions(store: impl SessionStore) -> Arc<Self> {
        Self::build(Duration::ZERO, SessionBackend::new(store))
    }

    fn build(delay: Duration, sessions: SessionBackend) -> Arc<Self> {
        Arc::new(Self {
            connects: AtomicUsize::new(0),
            reachable: AtomicBool::new(true),
            state: Mutex::new(ConnectionState::Disconnected),
            connect_delay: delay,
            sessions,
        })
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn set_state(&self, state: ConnectionState) {
        *self.state.lock().unwrap() = state;
    }
}

#[async_trait]
impl DocumentStore for FakeDatabase {
    async fn connect(&self) -> Result<(), DatabaseError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.set_state(ConnectionState::Connecting);
        tokio::time::sleep(self.connect_delay).await;

        if !self.reachable.load(Ordering::SeqCst) {
            self.set_state(ConnectionState::Disconnected);
            return Err(DatabaseError::Unreachable("connection refused".into()));
        }
        self.set_state(ConnectionState::Connected);
        Ok(())
    }

    fn connection_state(&self) -> ConnectionState {
        *self.state.lock().unwrap()
    }

    async fn session_store(&self) -> Result<SessionBackend, DatabaseError> {
        Ok(self.sessions.clone())
    }

    async fn disconnect(&self) {
        self.set_state(ConnectionState::Disconnected);
    }
}

/// Session store that finds nothing and fails every save.
#[derive(Debug, Clone, Default)]
pub struct UnwritableSessionStore;

#[async_trait]
impl SessionStore for UnwritableSessionStore {
    async fn save(&self, _record: &Record) -> session_store::Result<()> {
        Err(session_store::Error::Backend("session collection unavailable".into()))
    }

    async fn load(&self, _session_id: &Id) -> session_store::Result<Option<Record>> {
        Ok(None)
    }

    async fn delete(&self, _session_id: &Id) -> session_store::Result<()> {
        Ok(())
    }
}

/// Settings with a connection string, as a deployment would have.
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.database.uri = Some("mongodb://fake-host:27017/assessment".into());
    settings
}

pub fn production_settings() -> Settings {
    let mut settings = test_settings();
    settings.environment = assessment_api::config::Environment::Production;
    settings
}

/// Routes standing in for the application's route modules.
pub fn test_routes() -> Router<AppState> {
    Router::new()
        .route("/api/fail", get(fail))
        .route("/api/panic", get(panic_handler))
        .route("/api/session", post(sign_in).get(whoami).delete(sign_out))
        .route("/api/echo", post(echo))
}

async fn fail() -> Result<&'static str, ApiError> {
    let err = anyhow::anyhow!("widget lookup failed").context("loading dashboard");
    Err(err.into())
}

async fn panic_handler() -> &'static str {
    panic!("boom")
}

async fn sign_in(session: TypedSession) -> Result<StatusCode, ApiError> {
    session.renew().await?;
    session.insert_user_id("student-42").await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn sign_out(session: TypedSession) -> Result<StatusCode, ApiError> {
    session.log_out().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn whoami(request: Request) -> Json<Value> {
    let user = request
        .extensions()
        .get::<Identity>()
        .map(|identity| identity.user_id.clone());
    Json(json!({ "user": user }))
}

async fn echo(body: String) -> String {
    body
}

pub fn build_app(settings: Settings, database: Arc<FakeDatabase>) -> Arc<Application> {
    Arc::new(
        Application::builder(settings)
            .database(database)
            .routes(test_routes())
            .build(),
    )
}

/// A running server on an ephemeral loopback port.
pub struct TestApp {
    pub address: String,
    pub application: Arc<Application>,
    pub database: Arc<FakeDatabase>,
    shutdown: Shutdown,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn spawn_app(settings: Settings) -> TestApp {
    spawn_app_with(settings, FakeDatabase::new()).await
}

pub async fn spawn_app_with(settings: Settings, database: Arc<FakeDatabase>) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());

    let application = build_app(settings, database.clone());
    let shutdown = Shutdown::new();
    let server = HttpServer::new(application.clone());
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestApp {
        address,
        application,
        database,
        shutdown,
    }
}

/// Client that never goes through a system proxy.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
