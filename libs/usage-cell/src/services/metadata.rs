use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::models::UsageError;

pub const METADATA_TIMEOUT: Duration = Duration::from_secs(2);

const TOKEN_PATH: &str = "/latest/api/token";
const TOKEN_TTL_HEADER: &str = "X-aws-ec2-metadata-token-ttl-seconds";
const TOKEN_HEADER: &str = "X-aws-ec2-metadata-token";
const TOKEN_TTL_SECONDS: &str = "21600";

/// HTTP client for the EC2 instance metadata service. Every call asks for an
/// IMDSv2 session token first and falls back to IMDSv1 when none is issued.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    client: Client,
    endpoint: String,
}

impl MetadataClient {
    pub fn new(endpoint: &str) -> Result<Self, UsageError> {
        let client = Client::builder()
            .timeout(METADATA_TIMEOUT)
            .build()
            .map_err(|e| UsageError::Internal(format!("metadata client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Trimmed body of `GET {endpoint}{path}`. Empty bodies count as failures.
    pub async fn get(&self, path: &str) -> Result<String, String> {
        let token = self.session_token().await;

        let mut request = self.client.get(format!("{}{}", self.endpoint, path));
        if let Some(token) = &token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("metadata service returned HTTP {} for {}", status, path));
        }

        let body = response.text().await.map_err(|e| e.to_string())?;
        let body = body.trim();
        if body.is_empty() {
            return Err(format!("metadata service returned an empty body for {}", path));
        }

        Ok(body.to_string())
    }

    async fn session_token(&self) -> Option<String> {
        let response = self
            .client
            .put(format!("{}{}", self.endpoint, TOKEN_PATH))
            .header(TOKEN_TTL_HEADER, TOKEN_TTL_SECONDS)
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            debug!("IMDSv2 token request returned HTTP {}", response.status());
            return None;
        }

        response.text().await.ok().filter(|t| !t.trim().is_empty())
    }
}
