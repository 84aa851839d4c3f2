use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use shared_utils::aws_sigv4::AwsCredentials;

use crate::models::{InstanceProfileCredentialsResponse, UsageError};
use crate::services::metadata::MetadataClient;

const SECURITY_CREDENTIALS_PATH: &str = "/latest/meta-data/iam/security-credentials/";

/// Cached role credentials are replaced this long before they expire.
const REFRESH_MARGIN_MINUTES: i64 = 5;

/// Where CloudWatch request signing gets its keys from.
#[derive(Debug)]
pub enum CredentialProvider {
    /// Keys supplied through the environment or the secret store.
    Static(Arc<AwsCredentials>),
    /// Temporary role credentials served by the instance metadata service.
    InstanceProfile(InstanceProfileCredentials),
}

impl CredentialProvider {
    pub fn instance_profile(metadata: MetadataClient) -> Self {
        CredentialProvider::InstanceProfile(InstanceProfileCredentials::new(metadata))
    }

    pub async fn credentials(&self) -> Result<Arc<AwsCredentials>, UsageError> {
        match self {
            CredentialProvider::Static(credentials) => Ok(credentials.clone()),
            CredentialProvider::InstanceProfile(provider) => provider.credentials().await,
        }
    }
}

impl From<AwsCredentials> for CredentialProvider {
    fn from(credentials: AwsCredentials) -> Self {
        CredentialProvider::Static(Arc::new(credentials))
    }
}

#[derive(Debug)]
struct CachedCredentials {
    credentials: Arc<AwsCredentials>,
    expires_at: DateTime<Utc>,
}

impl CachedCredentials {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::minutes(REFRESH_MARGIN_MINUTES) < self.expires_at
    }
}

#[derive(Debug)]
pub struct InstanceProfileCredentials {
    metadata: MetadataClient,
    cache: RwLock<Option<CachedCredentials>>,
}

impl InstanceProfileCredentials {
    pub fn new(metadata: MetadataClient) -> Self {
        Self {
            metadata,
            cache: RwLock::new(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn credentials(&self) -> Result<Arc<AwsCredentials>, UsageError> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            if cached.is_fresh(Utc::now()) {
                return Ok(cached.credentials.clone());
            }
        }

        let mut cache = self.cache.write().await;
        // Another request may have refreshed while we waited for the lock.
        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh(Utc::now()) {
                return Ok(cached.credentials.clone());
            }
        }

        let fetched = self.fetch().await?;
        let credentials = fetched.credentials.clone();
        *cache = Some(fetched);
        Ok(credentials)
    }

    async fn fetch(&self) -> Result<CachedCredentials, UsageError> {
        let roles = self
            .metadata
            .get(SECURITY_CREDENTIALS_PATH)
            .await
            .map_err(|e| UsageError::Credentials(format!("no instance profile role: {}", e)))?;
        let role = roles
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| UsageError::Credentials("no instance profile role".to_string()))?;

        debug!("Fetching credentials for instance profile role {}", role);

        let body = self
            .metadata
            .get(&format!("{}{}", SECURITY_CREDENTIALS_PATH, role))
            .await
            .map_err(|e| UsageError::Credentials(e.to_string()))?;
        let response: InstanceProfileCredentialsResponse = serde_json::from_str(&body)
            .map_err(|e| UsageError::Credentials(format!("malformed role credentials: {}", e)))?;

        if let Some(code) = response.code.as_deref().filter(|code| *code != "Success") {
            return Err(UsageError::Credentials(format!(
                "metadata service reported {} for role {}",
                code, role
            )));
        }

        info!(
            "Loaded instance profile credentials for role {} (expire {})",
            role, response.expiration
        );

        Ok(CachedCredentials {
            credentials: Arc::new(AwsCredentials {
                access_key_id: response.access_key_id,
                secret_access_key: SecretString::from(response.secret_access_key),
                session_token: response.token.map(SecretString::from),
            }),
            expires_at: response.expiration,
        })
    }
}
