use std::env;

use secrecy::SecretString;
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SECRET_PATH: &str = "secret/cloudpulse";
pub const DEFAULT_FRONTEND_DIR: &str = "frontend";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_METADATA_ENDPOINT: &str = "http://169.254.169.254";

const REQUIRED_VARS: [&str; 5] = [
    "VAULT_ADDR",
    "VAULT_TOKEN",
    "AWS_REGION",
    "GITHUB_OWNER",
    "GITHUB_REPO",
];

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingVariables(Vec<String>),

    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

/// Cloud credentials supplied through the process environment.
#[derive(Debug)]
pub struct EnvAwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub session_token: Option<SecretString>,
}

#[derive(Debug)]
pub struct AppConfig {
    pub vault_addr: String,
    pub vault_token: SecretString,
    pub vault_secret_path: String,
    pub aws_region: String,
    pub aws_credentials: Option<EnvAwsCredentials>,
    pub github_owner: String,
    pub github_repo: String,
    pub github_api_url: String,
    pub cloudwatch_endpoint: String,
    pub metadata_endpoint: String,
    pub instance_id_override: Option<String>,
    pub frontend_dir: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Empty
    /// values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let missing: Vec<String> = REQUIRED_VARS
            .iter()
            .filter(|name| get(**name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingVariables(missing));
        }

        let required = |name: &str| {
            get(name).ok_or_else(|| ConfigError::MissingVariables(vec![name.to_string()]))
        };

        let aws_region = required("AWS_REGION")?;

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                name: "PORT".to_string(),
                reason: format!("{raw:?} is not a valid port ({e})"),
            })?,
            None => {
                info!("PORT not set, using default {}", DEFAULT_PORT);
                DEFAULT_PORT
            }
        };

        let aws_credentials = match (get("AWS_ACCESS_KEY_ID"), get("AWS_SECRET_ACCESS_KEY")) {
            (Some(access_key_id), Some(secret)) => Some(EnvAwsCredentials {
                access_key_id,
                secret_access_key: SecretString::from(secret),
                session_token: get("AWS_SESSION_TOKEN").map(SecretString::from),
            }),
            (Some(_), None) | (None, Some(_)) => {
                warn!("Only one of AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY is set, ignoring both");
                None
            }
            (None, None) => None,
        };

        let cloudwatch_endpoint = get("CLOUDWATCH_ENDPOINT")
            .unwrap_or_else(|| format!("https://monitoring.{}.amazonaws.com", aws_region));

        Ok(Self {
            vault_addr: trim_url(required("VAULT_ADDR")?),
            vault_token: SecretString::from(required("VAULT_TOKEN")?),
            vault_secret_path: get("VAULT_SECRET_PATH").unwrap_or_else(|| DEFAULT_SECRET_PATH.to_string()),
            aws_region,
            aws_credentials,
            github_owner: required("GITHUB_OWNER")?,
            github_repo: required("GITHUB_REPO")?,
            github_api_url: trim_url(
                get("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            ),
            cloudwatch_endpoint: trim_url(cloudwatch_endpoint),
            metadata_endpoint: trim_url(
                get("EC2_METADATA_ENDPOINT").unwrap_or_else(|| DEFAULT_METADATA_ENDPOINT.to_string()),
            ),
            instance_id_override: get("INSTANCE_ID"),
            frontend_dir: get("FRONTEND_DIR").unwrap_or_else(|| {
                warn!("FRONTEND_DIR not set, using default");
                DEFAULT_FRONTEND_DIR.to_string()
            }),
            port,
        })
    }
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
