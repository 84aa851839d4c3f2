use secrecy::SecretString;
use serde_json::{json, Value};

use shared_config::{AppConfig, EnvAwsCredentials};

use crate::aws_sigv4::AwsCredentials;

pub const TEST_VAULT_TOKEN: &str = "test-vault-token";
pub const TEST_GITHUB_TOKEN: &str = "ghp_test_token";
pub const TEST_SECRET_PATH: &str = "secret/cloudpulse";

/// Endpoints a test wants the service to talk to. Anything left as the
/// default points at an unroutable address so stray calls fail fast.
pub struct TestConfig {
    pub vault_addr: String,
    pub cloudwatch_endpoint: String,
    pub github_api_url: String,
    pub metadata_endpoint: String,
    pub instance_id_override: Option<String>,
    pub with_env_credentials: bool,
    pub frontend_dir: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            vault_addr: "http://127.0.0.1:1".to_string(),
            cloudwatch_endpoint: "http://127.0.0.1:1".to_string(),
            github_api_url: "http://127.0.0.1:1".to_string(),
            metadata_endpoint: "http://127.0.0.1:1".to_string(),
            instance_id_override: None,
            with_env_credentials: true,
            frontend_dir: "frontend".to_string(),
        }
    }
}

impl TestConfig {
    /// Routes every external dependency at one mock server.
    pub fn with_mock_server(uri: &str) -> Self {
        Self {
            vault_addr: uri.to_string(),
            cloudwatch_endpoint: uri.to_string(),
            github_api_url: uri.to_string(),
            metadata_endpoint: uri.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            vault_addr: self.vault_addr.clone(),
            vault_token: SecretString::from(TEST_VAULT_TOKEN),
            vault_secret_path: TEST_SECRET_PATH.to_string(),
            aws_region: "us-east-1".to_string(),
            aws_credentials: self.with_env_credentials.then(|| EnvAwsCredentials {
                access_key_id: "AKIDEXAMPLE".to_string(),
                secret_access_key: SecretString::from("test-secret-key"),
                session_token: None,
            }),
            github_owner: "octo-org".to_string(),
            github_repo: "cloudpulse".to_string(),
            github_api_url: self.github_api_url.clone(),
            cloudwatch_endpoint: self.cloudwatch_endpoint.clone(),
            metadata_endpoint: self.metadata_endpoint.clone(),
            instance_id_override: self.instance_id_override.clone(),
            frontend_dir: self.frontend_dir.clone(),
            port: 0,
        }
    }
}

pub fn test_aws_credentials() -> AwsCredentials {
    AwsCredentials {
        access_key_id: "AKIDEXAMPLE".to_string(),
        secret_access_key: SecretString::from("test-secret-key"),
        session_token: None,
    }
}

pub struct MockVaultResponses;

impl MockVaultResponses {
    pub fn kv_secret(fields: Value) -> Value {
        json!({
            "request_id": "5a1b2c3d",
            "lease_id": "",
            "renewable": false,
            "lease_duration": 0,
            "data": {
                "data": fields,
                "metadata": {
                    "created_time": "2024-01-01T00:00:00Z",
                    "deletion_time": "",
                    "destroyed": false,
                    "version": 1
                }
            }
        })
    }

    pub fn github_token_secret() -> Value {
        Self::kv_secret(json!({ "github_token": TEST_GITHUB_TOKEN }))
    }
}

pub struct MockCloudWatchResponses;

impl MockCloudWatchResponses {
    pub fn series(id: &str, label: &str, points: &[(f64, f64)]) -> Value {
        json!({
            "Id": id,
            "Label": label,
            "Timestamps": points.iter().map(|(ts, _)| *ts).collect::<Vec<_>>(),
            "Values": points.iter().map(|(_, v)| *v).collect::<Vec<_>>(),
            "StatusCode": "Complete"
        })
    }

    pub fn metric_data(results: Vec<Value>) -> Value {
        json!({
            "MetricDataResults": results,
            "Messages": []
        })
    }

    pub fn full_instance_metrics() -> Value {
        Self::metric_data(vec![
            Self::series("cpu", "CPUUtilization", &[(1_704_067_500.0, 12.5), (1_704_067_200.0, 9.0)]),
            Self::series("network_in", "NetworkIn", &[(1_704_067_500.0, 2048.0)]),
            Self::series("network_out", "NetworkOut", &[(1_704_067_500.0, 4096.0)]),
        ])
    }
}

pub const TEST_INSTANCE_ROLE: &str = "cloudpulse-instance-role";
pub const TEST_ROLE_SESSION_TOKEN: &str = "role-session-token";

pub struct MockMetadataResponses;

impl MockMetadataResponses {
    /// Body of `/latest/meta-data/iam/security-credentials/<role>`.
    pub fn role_credentials(expiration: &str) -> Value {
        json!({
            "Code": "Success",
            "LastUpdated": "2024-01-01T00:00:00Z",
            "Type": "AWS-HMAC",
            "AccessKeyId": "ASIAROLEEXAMPLE",
            "SecretAccessKey": "role-secret-key",
            "Token": TEST_ROLE_SESSION_TOKEN,
            "Expiration": expiration
        })
    }
}

pub struct MockGitHubResponses;

impl MockGitHubResponses {
    pub fn collaborator(login: &str, avatar_url: Option<&str>, role_name: Option<&str>) -> Value {
        json!({
            "login": login,
            "id": 1,
            "avatar_url": avatar_url,
            "html_url": format!("https://github.com/{}", login),
            "type": "User",
            "site_admin": false,
            "role_name": role_name
        })
    }
}
