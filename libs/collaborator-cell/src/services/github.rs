// libs/collaborator-cell/src/services/github.rs
use reqwest::{header, Client};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, info, instrument, warn};

use shared_config::AppConfig;

use crate::models::{CollaboratorError, CollaboratorRecord, GitHubCollaborator};

pub const PAGE_SIZE: u32 = 100;

const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = "cloudpulse";

/// GitHub REST client bound to one owner/repo pair.
#[derive(Debug)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
    token: SecretString,
    owner: String,
    repo: String,
}

impl GitHubClient {
    pub fn new(config: &AppConfig, token: SecretString) -> Result<Self, CollaboratorError> {
        Self::with_repository(&config.github_api_url, &config.github_owner, &config.github_repo, token)
    }

    pub fn with_repository(
        base_url: &str,
        owner: &str,
        repo: &str,
        token: SecretString,
    ) -> Result<Self, CollaboratorError> {
        if owner.trim().is_empty() || repo.trim().is_empty() {
            return Err(CollaboratorError::NotConfigured(
                "repository owner and name are required".to_string(),
            ));
        }
        if token.expose_secret().trim().is_empty() {
            return Err(CollaboratorError::NotConfigured("token is empty".to_string()));
        }

        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// First page (up to 100) of repository collaborators, in API order.
    /// GET /repos/{owner}/{repo}/collaborators
    #[instrument(skip(self))]
    pub async fn list_collaborators(&self) -> Result<Vec<CollaboratorRecord>, CollaboratorError> {
        let url = format!(
            "{}/repos/{}/{}/collaborators",
            self.base_url, self.owner, self.repo
        );
        debug!("Listing collaborators from: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("per_page", PAGE_SIZE)])
            .bearer_auth(self.token.expose_secret())
            .header(header::ACCEPT, ACCEPT)
            .header(header::USER_AGENT, USER_AGENT)
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await
            .map_err(|e| CollaboratorError::GitHubApiError {
                message: e.to_string(),
            })?;

        let status = response.status();
        let has_next_page = response
            .headers()
            .get(header::LINK)
            .and_then(|v| v.to_str().ok())
            .map(|link| link.contains("rel=\"next\""))
            .unwrap_or(false);
        let response_text = response
            .text()
            .await
            .map_err(|e| CollaboratorError::GitHubApiError {
                message: e.to_string(),
            })?;

        if !status.is_success() {
            error!("GitHub collaborator listing failed: {} - {}", status, response_text);
            return Err(CollaboratorError::GitHubApiError {
                message: format!("HTTP {}: {}", status, response_text),
            });
        }

        let collaborators: Vec<GitHubCollaborator> = serde_json::from_str(&response_text)
            .map_err(|e| CollaboratorError::GitHubApiError {
                message: format!("Failed to parse collaborators response: {}", e),
            })?;

        if has_next_page {
            warn!(
                "{} has more than {} collaborators; only the first page is returned",
                self.repository(),
                PAGE_SIZE
            );
        }

        info!("Fetched {} collaborators for {}", collaborators.len(), self.repository());
        Ok(collaborators.into_iter().map(CollaboratorRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation_fails_without_repository() {
        let client = GitHubClient::with_repository(
            "https://api.github.com",
            "octo-org",
            "",
            SecretString::from("token"),
        );
        assert!(matches!(client, Err(CollaboratorError::NotConfigured(_))));
    }

    #[test]
    fn test_client_creation_fails_without_token() {
        let client = GitHubClient::with_repository(
            "https://api.github.com",
            "octo-org",
            "cloudpulse",
            SecretString::from(" "),
        );
        assert!(matches!(client, Err(CollaboratorError::NotConfigured(_))));
    }

    #[test]
    fn test_repository_name() {
        let client = GitHubClient::with_repository(
            "https://api.github.com/",
            "octo-org",
            "cloudpulse",
            SecretString::from("token"),
        )
        .unwrap();
        assert_eq!(client.repository(), "octo-org/cloudpulse");
        assert_eq!(client.base_url, "https://api.github.com");
    }
}
