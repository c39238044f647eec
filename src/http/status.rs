//! `GET /api/status`.

use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::http::pipeline::AppState;

/// Path the status endpoint is mounted on.
pub const STATUS_PATH: &str = "/api/status";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub status: &'static str,
    pub mongo_connection: &'static str,
    pub timestamp: String,
}

pub async fn report(State(state): State<AppState>) -> Json<StatusReport> {
    Json(StatusReport {
        status: "ok",
        mongo_connection: state.database.connection_state().as_status(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let report = StatusReport {
            status: "ok",
            mongo_connection: "connected",
            timestamp: "2024-05-01T12:00:00.000Z".into(),
        };
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            serde_json::json!({
                "status": "ok",
                "mongoConnection": "connected",
                "timestamp": "2024-05-01T12:00:00.000Z",
            })
        );
    }
}
