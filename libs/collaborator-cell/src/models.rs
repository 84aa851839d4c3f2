// libs/collaborator-cell/src/models.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One repository collaborator as returned to the dashboard. Every field is
/// always present; missing upstream values become empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorRecord {
    pub login: String,
    pub avatar_url: String,
    pub html_url: String,
    pub role_name: String,
}

/// Subset of the GitHub collaborator payload this cell reads.
#[derive(Debug, Deserialize)]
pub struct GitHubCollaborator {
    pub login: Option<String>,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
    pub role_name: Option<String>,
}

impl From<GitHubCollaborator> for CollaboratorRecord {
    fn from(raw: GitHubCollaborator) -> Self {
        Self {
            login: raw.login.unwrap_or_default(),
            avatar_url: raw.avatar_url.unwrap_or_default(),
            html_url: raw.html_url.unwrap_or_default(),
            role_name: raw.role_name.unwrap_or_default(),
        }
    }
}

#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("GitHub client not configured: {0}")]
    NotConfigured(String),

    #[error("GitHub API error: {message}")]
    GitHubApiError { message: String },
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_missing_fields_become_empty_strings() {
        let raw: GitHubCollaborator = serde_json::from_value(json!({
            "login": "octocat",
            "avatar_url": null
        }))
        .unwrap();

        let record = CollaboratorRecord::from(raw);
        assert_eq!(record.login, "octocat");
        assert_eq!(record.avatar_url, "");
        assert_eq!(record.html_url, "");
        assert_eq!(record.role_name, "");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 4);
    }
}
