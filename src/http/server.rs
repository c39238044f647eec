//! HTTP server loop.
//!
//! # Responsibilities
//! - Bind the application entry point to a listener
//! - Stop accepting on shutdown and drain in-flight requests
//! - Close the database connection once drained

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::bootstrap::Application;

/// Long-running HTTP server for the application.
pub struct HttpServer {
    app: Arc<Application>,
}

impl HttpServer {
    pub fn new(app: Arc<Application>) -> Self {
        Self { app }
    }

    /// Serve until `shutdown` fires, then drain and disconnect.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let router = self.app.clone().into_router();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        self.app.shutdown().await;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
