use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use usage_cell::{IdentitySource, InstanceIdentityResolver};

#[tokio::test]
async fn test_resolves_instance_id_with_imdsv2_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/latest/api/token"))
        .and(header("X-aws-ec2-metadata-token-ttl-seconds", "21600"))
        .respond_with(ResponseTemplate::new(200).set_body_string("imds-token"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/latest/meta-data/instance-id"))
        .and(header("X-aws-ec2-metadata-token", "imds-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("i-0123456789abcdef0\n"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let resolver = InstanceIdentityResolver::new(&mock_server.uri()).unwrap();
    let identity = resolver.resolve(Some("i-override")).await;

    assert_eq!(identity.instance_id(), Some("i-0123456789abcdef0"));
    assert_eq!(identity.source(), IdentitySource::Metadata);
}

#[tokio::test]
async fn test_falls_back_to_imdsv1_when_token_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/latest/api/token"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/latest/meta-data/instance-id"))
        .respond_with(ResponseTemplate::new(200).set_body_string("i-v1"))
        .mount(&mock_server)
        .await;

    let resolver = InstanceIdentityResolver::new(&mock_server.uri()).unwrap();
    let identity = resolver.resolve(None).await;

    assert_eq!(identity.instance_id(), Some("i-v1"));
}

#[tokio::test]
async fn test_non_success_status_uses_override() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/latest/meta-data/instance-id"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let resolver = InstanceIdentityResolver::new(&mock_server.uri()).unwrap();
    let identity = resolver.resolve(Some("i-local")).await;

    assert_eq!(identity.instance_id(), Some("i-local"));
    assert_eq!(identity.source(), IdentitySource::Override);
}

#[tokio::test]
async fn test_unreachable_metadata_without_override_is_unresolved() {
    let resolver = InstanceIdentityResolver::new("http://127.0.0.1:1").unwrap();

    let identity = resolver.resolve(None).await;
    assert!(!identity.is_resolved());
    assert_eq!(identity.source(), IdentitySource::Unresolved);

    let blank_override = resolver.resolve(Some("  ")).await;
    assert!(!blank_override.is_resolved());
}

#[tokio::test]
async fn test_slow_metadata_service_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/latest/meta-data/instance-id"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("i-too-late")
                .set_delay(std::time::Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let resolver = InstanceIdentityResolver::new(&mock_server.uri()).unwrap();
    let started = std::time::Instant::now();
    let identity = resolver.resolve(Some("i-fallback")).await;

    assert_eq!(identity.instance_id(), Some("i-fallback"));
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
}
