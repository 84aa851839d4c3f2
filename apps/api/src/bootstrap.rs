//! Ordered startup chain: secrets, then instance identity, then API clients.
//! Any failing step aborts startup before the listener is bound.

use std::sync::Arc;

use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{info, warn};

use collaborator_cell::{CollaboratorError, GitHubClient};
use shared_config::{AppConfig, ConfigError};
use shared_secrets::{KvSecret, SecretError, VaultClient};
use shared_utils::AwsCredentials;
use usage_cell::{
    CloudWatchClient, CredentialProvider, InstanceIdentityResolver, MetadataClient, UsageError,
    UsageState,
};

pub const GITHUB_TOKEN_KEY: &str = "github_token";
pub const AWS_ACCESS_KEY_ID_KEY: &str = "aws_access_key_id";
pub const AWS_SECRET_ACCESS_KEY_KEY: &str = "aws_secret_access_key";
pub const AWS_SESSION_TOKEN_KEY: &str = "aws_session_token";

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("secret store error: {0}")]
    Secret(#[from] SecretError),

    #[error("metrics client error: {0}")]
    Usage(#[from] UsageError),

    #[error("GitHub client error: {0}")]
    Collaborators(#[from] CollaboratorError),
}

/// Everything the HTTP layer needs, built once and shared read-only.
#[derive(Debug)]
pub struct AppContext {
    pub config: AppConfig,
    pub usage: Arc<UsageState>,
    pub collaborators: Arc<GitHubClient>,
}

pub async fn initialize(mut config: AppConfig) -> Result<AppContext, StartupError> {
    let vault = VaultClient::new(&config)?;
    let secret = vault.read(&config.vault_secret_path).await?;
    let github_token = secret.require(GITHUB_TOKEN_KEY)?;
    let metadata = MetadataClient::new(&config.metadata_endpoint)?;
    let aws_credentials = resolve_aws_credentials(&mut config, &secret, &metadata)?;

    let resolver = InstanceIdentityResolver::with_client(metadata);
    let identity = resolver
        .resolve(config.instance_id_override.as_deref())
        .await;

    let metrics = CloudWatchClient::new(&config.cloudwatch_endpoint, &config.aws_region, aws_credentials)?;
    let collaborators = GitHubClient::new(&config, github_token)?;

    info!(
        "Initialized clients (region {}, repository {}, instance {:?})",
        config.aws_region,
        collaborators.repository(),
        identity.source()
    );

    Ok(AppContext {
        config,
        usage: Arc::new(UsageState::new(metrics, identity)),
        collaborators: Arc::new(collaborators),
    })
}

/// Environment credentials win, then a key pair stored in the secret, then the
/// instance profile role. Role credentials are fetched on the first metrics
/// request, so startup never fails for want of AWS keys.
fn resolve_aws_credentials(
    config: &mut AppConfig,
    secret: &KvSecret,
    metadata: &MetadataClient,
) -> Result<CredentialProvider, StartupError> {
    if let Some(env) = config.aws_credentials.take() {
        info!("Using AWS credentials from the environment");
        return Ok(CredentialProvider::from(AwsCredentials {
            access_key_id: env.access_key_id,
            secret_access_key: env.secret_access_key,
            session_token: env.session_token,
        }));
    }

    match (
        secret.optional(AWS_ACCESS_KEY_ID_KEY)?,
        secret.optional(AWS_SECRET_ACCESS_KEY_KEY)?,
    ) {
        (Some(access_key_id), Some(secret_access_key)) => {
            info!("Using AWS credentials from the secret store");
            Ok(CredentialProvider::from(AwsCredentials {
                access_key_id: access_key_id.expose_secret().to_string(),
                secret_access_key,
                session_token: secret.optional(AWS_SESSION_TOKEN_KEY)?,
            }))
        }
        _ => {
            warn!("No static AWS credentials configured; using the instance profile role");
            Ok(CredentialProvider::instance_profile(metadata.clone()))
        }
    }
}
