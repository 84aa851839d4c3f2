// =====================================================================================
// USAGE CELL ROUTER TESTS
// =====================================================================================

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_utils::test_utils::{test_aws_credentials, MockCloudWatchResponses};
use usage_cell::{usage_routes, CloudWatchClient, InstanceIdentity, UsageState};

fn app(endpoint: &str, identity: InstanceIdentity) -> Router {
    let metrics = CloudWatchClient::new(endpoint, "us-east-1", test_aws_credentials()).unwrap();
    usage_routes(Arc::new(UsageState::new(metrics, identity)))
}

async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header("origin", "http://dashboard.example")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_ec2_usage_endpoint() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockCloudWatchResponses::full_instance_metrics()))
        .mount(&mock_server)
        .await;

    let (status, headers, json) = get(
        app(&mock_server.uri(), InstanceIdentity::from_metadata("i-0abc")),
        "/ec2-usage",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(headers["access-control-allow-origin"], "*");

    assert_eq!(json["InstanceID"], "i-0abc");
    for key in ["CPUUtilization", "NetworkIn", "NetworkOut"] {
        assert!(json[key].is_number(), "{} should be numeric", key);
    }
    for key in ["CPUTimestamp", "NetworkInTimestamp", "NetworkOutTimestamp"] {
        let ts = json[key].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok(), "{} should be RFC3339", key);
    }
}

#[tokio::test]
async fn test_ec2_usage_without_identity_is_503() {
    let (status, headers, json) = get(
        app("http://127.0.0.1:1", InstanceIdentity::unresolved()),
        "/ec2-usage",
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(headers["content-type"], "application/json");
    assert!(json["error"].as_str().unwrap().contains("instance ID"));
}

#[tokio::test]
async fn test_ec2_usage_remote_failure_is_500() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("InternalFailure"))
        .mount(&mock_server)
        .await;

    let (status, _, json) = get(
        app(&mock_server.uri(), InstanceIdentity::from_metadata("i-0abc")),
        "/ec2-usage",
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("InternalFailure"));
}

#[tokio::test]
async fn test_free_tier_usage_is_constant() {
    let router = app("http://127.0.0.1:1", InstanceIdentity::unresolved());

    let (status, headers, first) = get(router.clone(), "/free-tier-usage").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["access-control-allow-origin"], "*");

    for _ in 0..3 {
        let (_, _, again) = get(router.clone(), "/free-tier-usage").await;
        assert_eq!(again, first);
    }
    assert_eq!(first["message"], usage_cell::models::FREE_TIER_MESSAGE);
}
