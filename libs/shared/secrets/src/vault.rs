use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use shared_config::AppConfig;

const TOKEN_HEADER: &str = "X-Vault-Token";

#[derive(Error, Debug)]
pub enum SecretError {
    #[error("no secret store token configured")]
    NoToken,

    #[error("invalid secret path {0:?}, expected \"mount/subpath\"")]
    InvalidPath(String),

    #[error("secret store connection error: {0}")]
    Connection(String),

    #[error("secret store denied access to {0}")]
    Denied(String),

    #[error("secret not found: {0}")]
    NotFound(String),

    #[error("malformed secret: {0}")]
    Malformed(String),
}

#[derive(Debug, Deserialize)]
struct KvV2Response {
    data: Option<KvV2Data>,
}

#[derive(Debug, Deserialize)]
struct KvV2Data {
    data: Option<Map<String, Value>>,
}

/// The latest version of one KV secret.
#[derive(Debug)]
pub struct KvSecret {
    path: String,
    fields: Map<String, Value>,
}

impl KvSecret {
    pub fn require(&self, key: &str) -> Result<SecretString, SecretError> {
        self.optional(key)?
            .ok_or_else(|| SecretError::NotFound(format!("{}#{}", self.path, key)))
    }

    /// Absent and null fields are `None`; a present non-string field is an error.
    pub fn optional(&self, key: &str) -> Result<Option<SecretString>, SecretError> {
        match self.fields.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(SecretString::from(value.clone()))),
            Some(_) => Err(SecretError::Malformed(format!(
                "{}#{} is not a string",
                self.path, key
            ))),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

#[derive(Debug)]
pub struct VaultClient {
    client: Client,
    address: String,
    token: SecretString,
}

impl VaultClient {
    pub fn new(config: &AppConfig) -> Result<Self, SecretError> {
        Self::with_token(
            &config.vault_addr,
            SecretString::from(config.vault_token.expose_secret().to_string()),
        )
    }

    pub fn with_token(address: &str, token: SecretString) -> Result<Self, SecretError> {
        if token.expose_secret().trim().is_empty() {
            return Err(SecretError::NoToken);
        }
        if address.trim().is_empty() {
            return Err(SecretError::Connection("no secret store address configured".to_string()));
        }

        Ok(Self {
            client: Client::new(),
            address: address.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Reads the latest version of the secret at `mount/subpath`.
    #[instrument(skip(self))]
    pub async fn read(&self, path: &str) -> Result<KvSecret, SecretError> {
        let (mount, subpath) = split_path(path)?;
        let url = format!("{}/v1/{}/data/{}", self.address, mount, subpath);
        debug!("Reading secret from {}", url);

        let response = self
            .client
            .get(&url)
            .header(TOKEN_HEADER, self.token.expose_secret())
            .send()
            .await
            .map_err(|e| SecretError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Secret store error ({}): {}", status, error_text);

            return Err(match status {
                StatusCode::NOT_FOUND => SecretError::NotFound(path.to_string()),
                StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
                    SecretError::Denied(path.to_string())
                }
                _ => SecretError::Connection(format!("HTTP {}: {}", status, error_text)),
            });
        }

        let body: KvV2Response = response
            .json()
            .await
            .map_err(|e| SecretError::Malformed(format!("{}: {}", path, e)))?;

        let fields = body
            .data
            .and_then(|d| d.data)
            .ok_or_else(|| SecretError::NotFound(format!("{} has no data", path)))?;

        info!("Loaded secret {} ({} fields)", path, fields.len());
        Ok(KvSecret {
            path: path.to_string(),
            fields,
        })
    }

    pub async fn get_secret(&self, path: &str, key: &str) -> Result<SecretString, SecretError> {
        self.read(path).await?.require(key)
    }
}

fn split_path(path: &str) -> Result<(&str, &str), SecretError> {
    let trimmed = path.trim_matches('/');
    match trimmed.split_once('/') {
        Some((mount, subpath)) if !mount.is_empty() && !subpath.is_empty() => Ok((mount, subpath)),
        _ => Err(SecretError::InvalidPath(path.to_string())),
    }
}
