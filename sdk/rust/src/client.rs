use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};

type Error = Box<dyn std::error::Error + Send + Sync>;

/// Body of `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub status: String,
    pub mongo_connection: String,
    pub timestamp: String,
}

/// Body of a 500 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub stack: Option<String>,
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the service status.
    pub async fn status(&self) -> Result<StatusReport, Error> {
        let resp = self
            .client
            .get(format!("{}/api/status", self.base_url))
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(format!("API returned error status {}: {}", status, text).into());
        }

        Ok(serde_json::from_str::<StatusReport>(&text)?)
    }

    /// Send an `OPTIONS` request to `path`.
    pub async fn preflight(&self, path: &str) -> Result<Response, reqwest::Error> {
        self.client
            .request(Method::OPTIONS, format!("{}{}", self.base_url, path))
            .send()
            .await
    }

    /// Plain `GET` of `path`.
    pub async fn get(&self, path: &str) -> Result<Response, reqwest::Error> {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
    }
}
