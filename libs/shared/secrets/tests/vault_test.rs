use assert_matches::assert_matches;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_secrets::{SecretError, VaultClient};
use shared_utils::test_utils::{MockVaultResponses, TestConfig, TEST_GITHUB_TOKEN, TEST_VAULT_TOKEN};

async fn vault_with_secret(body: serde_json::Value) -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/secret/data/cloudpulse"))
        .and(header("X-Vault-Token", TEST_VAULT_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&mock_server)
        .await;

    mock_server
}

#[tokio::test]
async fn test_get_secret_reads_kv_v2_field() {
    let mock_server = vault_with_secret(MockVaultResponses::github_token_secret()).await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();

    let client = VaultClient::new(&config).unwrap();
    let token = client.get_secret("secret/cloudpulse", "github_token").await.unwrap();

    assert_eq!(token.expose_secret(), TEST_GITHUB_TOKEN);
}

#[tokio::test]
async fn test_read_exposes_multiple_fields() {
    let mock_server = vault_with_secret(MockVaultResponses::kv_secret(json!({
        "github_token": "ghp_a",
        "aws_access_key_id": "AKIDEXAMPLE",
        "aws_secret_access_key": "secret"
    })))
    .await;

    let client = VaultClient::with_token(&mock_server.uri(), SecretString::from(TEST_VAULT_TOKEN)).unwrap();
    let secret = client.read("secret/cloudpulse").await.unwrap();

    assert_eq!(secret.keys().count(), 3);
    assert_eq!(secret.require("aws_access_key_id").unwrap().expose_secret(), "AKIDEXAMPLE");
    assert!(secret.optional("aws_session_token").unwrap().is_none());
}

#[tokio::test]
async fn test_missing_key_is_not_found() {
    let mock_server = vault_with_secret(MockVaultResponses::kv_secret(json!({ "other": "x" }))).await;

    let client = VaultClient::with_token(&mock_server.uri(), SecretString::from(TEST_VAULT_TOKEN)).unwrap();
    let result = client.get_secret("secret/cloudpulse", "github_token").await;

    assert_matches!(result, Err(SecretError::NotFound(msg)) if msg.contains("github_token"));
}

#[tokio::test]
async fn test_non_string_key_is_malformed() {
    let mock_server = vault_with_secret(MockVaultResponses::kv_secret(json!({ "github_token": 42 }))).await;

    let client = VaultClient::with_token(&mock_server.uri(), SecretString::from(TEST_VAULT_TOKEN)).unwrap();
    let result = client.get_secret("secret/cloudpulse", "github_token").await;

    assert_matches!(result, Err(SecretError::Malformed(_)));
}

#[tokio::test]
async fn test_path_without_data_is_not_found() {
    let mock_server = vault_with_secret(json!({ "data": null })).await;

    let client = VaultClient::with_token(&mock_server.uri(), SecretString::from(TEST_VAULT_TOKEN)).unwrap();
    let result = client.read("secret/cloudpulse").await;

    assert_matches!(result, Err(SecretError::NotFound(_)));
}

#[tokio::test]
async fn test_http_status_mapping() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/secret/data/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "errors": [] })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/forbidden"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "errors": ["permission denied"] })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/sealed"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Vault is sealed"))
        .mount(&mock_server)
        .await;

    let client = VaultClient::with_token(&mock_server.uri(), SecretString::from(TEST_VAULT_TOKEN)).unwrap();

    assert_matches!(client.read("secret/missing").await, Err(SecretError::NotFound(_)));
    assert_matches!(client.read("secret/forbidden").await, Err(SecretError::Denied(_)));
    assert_matches!(
        client.read("secret/sealed").await,
        Err(SecretError::Connection(msg)) if msg.contains("sealed")
    );
}

#[tokio::test]
async fn test_unreachable_store_is_connection_error() {
    let client = VaultClient::with_token("http://127.0.0.1:1", SecretString::from(TEST_VAULT_TOKEN)).unwrap();

    assert_matches!(client.read("secret/cloudpulse").await, Err(SecretError::Connection(_)));
}
