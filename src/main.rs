//! assessment-api
//!
//! Long-running HTTP server around the lazily built request pipeline.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ axum::serve ──▶ Application::handle
//!                                          │
//!                          OPTIONS ◀───────┤ (200, empty)
//!                                          ▼
//!                                 pipeline ready? ── no ──▶ connect MongoDB
//!                                          │                 session store
//!                                          │                 build layers + routes
//!                                          ▼                        │
//!     Client Response              cached Router ◀──────────────────┘
//!     ◀────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use assessment_api::config::loader::{load_config, load_from_env};
use assessment_api::lifecycle::shutdown_signal;
use assessment_api::observability::{logging, metrics};
use assessment_api::{Application, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "assessment-api")]
#[command(about = "HTTP API with lazily built pipeline and MongoDB sessions", long_about = None)]
struct Args {
    /// TOML configuration file; environment variables override its values
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let settings = match &args.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };

    logging::init_logging(&settings)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?settings.environment,
        "assessment-api starting"
    );

    if settings.environment.is_production() && settings.session.uses_default_secret() {
        tracing::warn!("SESSION_SECRET is not set; sessions are signed with the built-in fallback secret");
    }
    if settings.database.connection_string().is_none() {
        tracing::warn!("MONGO_DB is not set; requests will fail until it is configured");
    }

    if settings.observability.metrics_enabled {
        let addr: SocketAddr = settings.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&settings.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let app = Arc::new(Application::new(settings));
    let server = HttpServer::new(app);

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server_task = tokio::spawn(server.run(listener, server_shutdown));

    shutdown_signal().await;
    shutdown.trigger();
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
