//! AWS Lambda entry point.
//!
//! The runtime keeps the process warm between invocations, so the pipeline
//! built by the first request is reused by the ones after it.

use std::sync::Arc;

use lambda_http::{run, Error};

use assessment_api::config::loader::load_from_env;
use assessment_api::observability::logging;
use assessment_api::Application;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let settings = load_from_env()?;
    logging::init_logging(&settings)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?settings.environment,
        "assessment-api lambda starting"
    );

    let app = Arc::new(Application::new(settings));
    run(app.into_router()).await
}
