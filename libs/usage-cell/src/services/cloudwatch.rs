use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, Url};
use tracing::{debug, error, info, instrument, warn};

use shared_utils::aws_sigv4::{self, SignableRequest};

use crate::models::{
    Dimension, GetMetricDataRequest, GetMetricDataResponse, InstanceIdentity, InstanceUsage,
    Metric, MetricDataQuery, MetricDataResult, MetricKind, MetricReading, MetricStat, UsageError,
};
use crate::services::credentials::CredentialProvider;

const SERVICE: &str = "monitoring";
const TARGET: &str = "GraniteServiceVersion20100801.GetMetricData";
const CONTENT_TYPE: &str = "application/x-amz-json-1.0";
const NAMESPACE: &str = "AWS/EC2";
const PERIOD_SECONDS: u32 = 300;
const WINDOW_MINUTES: i64 = 10;

/// CloudWatch client for the fixed EC2 metric set shown on the dashboard.
/// Requests are signed with SigV4 and sent over the AWS JSON 1.0 protocol.
#[derive(Debug)]
pub struct CloudWatchClient {
    client: Client,
    endpoint: Url,
    host: String,
    region: String,
    credentials: CredentialProvider,
}

impl CloudWatchClient {
    pub fn new(
        endpoint: &str,
        region: &str,
        credentials: impl Into<CredentialProvider>,
    ) -> Result<Self, UsageError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| UsageError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        let host = match (endpoint.host_str(), endpoint.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(UsageError::InvalidEndpoint(endpoint.to_string())),
        };

        Ok(Self {
            client: Client::new(),
            endpoint,
            host,
            region: region.to_string(),
            credentials: credentials.into(),
        })
    }

    /// Latest CPU, network-in and network-out datapoints over the last ten minutes.
    #[instrument(skip(self))]
    pub async fn fetch_instance_metrics(
        &self,
        identity: &InstanceIdentity,
    ) -> Result<InstanceUsage, UsageError> {
        let instance_id = identity.instance_id().ok_or(UsageError::IdentityMissing)?;

        let end = Utc::now();
        let start = end - Duration::minutes(WINDOW_MINUTES);
        let results = self
            .get_metric_data(&instance_queries(instance_id), start, end)
            .await?;

        Ok(build_usage(instance_id, &results))
    }

    pub async fn get_metric_data(
        &self,
        queries: &[MetricDataQuery],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MetricDataResult>, UsageError> {
        let request = GetMetricDataRequest {
            metric_data_queries: queries,
            start_time: start.timestamp(),
            end_time: end.timestamp(),
            scan_by: "TimestampDescending",
        };
        let payload = serde_json::to_vec(&request)
            .map_err(|e| UsageError::Internal(format!("failed to encode request: {}", e)))?;

        let credentials = self.credentials.credentials().await?;
        let signed = aws_sigv4::sign(
            &credentials,
            &SignableRequest {
                method: "POST",
                host: &self.host,
                path: self.endpoint.path(),
                query: "",
                headers: &[("content-type", CONTENT_TYPE), ("x-amz-target", TARGET)],
                payload: &payload,
            },
            &self.region,
            SERVICE,
            Utc::now(),
        )
        .map_err(|e| UsageError::Internal(e.to_string()))?;

        debug!("Sending GetMetricData request to {}", self.endpoint);

        let mut builder = self
            .client
            .post(self.endpoint.clone())
            .header("content-type", CONTENT_TYPE)
            .header("x-amz-target", TARGET)
            .header("x-amz-date", &signed.amz_date)
            .header("authorization", &signed.authorization);
        if let Some(token) = &signed.security_token {
            builder = builder.header("x-amz-security-token", token);
        }

        let response = builder
            .body(payload)
            .send()
            .await
            .map_err(|e| UsageError::Remote(e.to_string()))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| UsageError::Remote(e.to_string()))?;

        if !status.is_success() {
            error!("CloudWatch GetMetricData failed: {} - {}", status, response_text);
            return Err(UsageError::Remote(format!("HTTP {}: {}", status, response_text)));
        }

        let parsed: GetMetricDataResponse = serde_json::from_str(&response_text).map_err(|e| {
            UsageError::Remote(format!("failed to parse GetMetricData response: {}", e))
        })?;

        info!(
            "GetMetricData returned {} series",
            parsed.metric_data_results.len()
        );
        for result in parsed.metric_data_results.iter().filter(|r| r.is_partial()) {
            warn!("Series {} returned partial data", result.id);
        }
        Ok(parsed.metric_data_results)
    }
}

pub fn instance_queries(instance_id: &str) -> Vec<MetricDataQuery> {
    MetricKind::ALL
        .into_iter()
        .map(|kind| MetricDataQuery {
            id: kind.query_id(),
            metric_stat: MetricStat {
                metric: Metric {
                    namespace: NAMESPACE,
                    metric_name: kind.metric_name(),
                    dimensions: vec![Dimension {
                        name: "InstanceId",
                        value: instance_id.to_string(),
                    }],
                },
                period: PERIOD_SECONDS,
                stat: kind.statistic(),
            },
            return_data: true,
        })
        .collect()
}

pub fn build_usage(instance_id: &str, results: &[MetricDataResult]) -> InstanceUsage {
    let reading_for = |kind: MetricKind| {
        results
            .iter()
            .find(|r| MetricKind::from_query_id(&r.id) == Some(kind))
            .map(series_reading)
            .unwrap_or(MetricReading::Unavailable)
    };

    let message = results.is_empty().then(|| {
        format!(
            "No CloudWatch data available for instance {} in the last {} minutes",
            instance_id, WINDOW_MINUTES
        )
    });

    InstanceUsage {
        instance_id: instance_id.to_string(),
        cpu_utilization: reading_for(MetricKind::CpuUtilization),
        network_in: reading_for(MetricKind::NetworkIn),
        network_out: reading_for(MetricKind::NetworkOut),
        message,
    }
}

/// Points whose timestamp does not map to a calendar time are skipped.
fn series_reading(result: &MetricDataResult) -> MetricReading {
    let (timestamps, values): (Vec<DateTime<Utc>>, Vec<f64>) = result
        .timestamps
        .iter()
        .zip(result.values.iter())
        .filter_map(|(secs, value)| {
            DateTime::from_timestamp(secs.trunc() as i64, 0).map(|timestamp| (timestamp, *value))
        })
        .unzip();

    MetricReading::latest(&timestamps, &values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(id: &str, timestamps: Vec<f64>, values: Vec<f64>) -> MetricDataResult {
        MetricDataResult {
            id: id.to_string(),
            timestamps,
            values,
            status_code: Some("Complete".to_string()),
        }
    }

    #[test]
    fn test_instance_queries_cover_fixed_metric_set() {
        let queries = instance_queries("i-0abc");

        let summary: Vec<_> = queries
            .iter()
            .map(|q| (q.id, q.metric_stat.metric.metric_name, q.metric_stat.stat))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("cpu", "CPUUtilization", "Average"),
                ("network_in", "NetworkIn", "Sum"),
                ("network_out", "NetworkOut", "Sum"),
            ]
        );
        assert!(queries.iter().all(|q| q.metric_stat.period == 300
            && q.metric_stat.metric.dimensions[0].value == "i-0abc"));
    }

    #[test]
    fn test_build_usage_marks_empty_series_unavailable() {
        let results = vec![
            series("cpu", vec![1_704_067_500.0], vec![42.0]),
            series("network_in", vec![], vec![]),
        ];

        let usage = build_usage("i-0abc", &results);
        assert_eq!(usage.cpu_utilization.value(), Some(42.0));
        assert_eq!(usage.network_in, MetricReading::Unavailable);
        assert_eq!(usage.network_out, MetricReading::Unavailable);
        assert!(usage.message.is_none());
    }

    #[test]
    fn test_out_of_range_timestamp_skips_only_that_point() {
        let results = vec![series(
            "cpu",
            vec![1e20, 1_704_067_200.0, 1_704_067_500.0],
            vec![99.0, 10.0, 20.0],
        )];

        let usage = build_usage("i-0abc", &results);
        assert_eq!(usage.cpu_utilization.value(), Some(20.0));
    }

    #[test]
    fn test_partial_series_is_still_read() {
        let mut partial = series("network_out", vec![1_704_067_500.0], vec![512.0]);
        partial.status_code = Some("PartialData".to_string());
        assert!(partial.is_partial());

        let usage = build_usage("i-0abc", &[partial]);
        assert_eq!(usage.network_out.value(), Some(512.0));
    }

    #[test]
    fn test_build_usage_without_results_adds_message() {
        let usage = build_usage("i-0abc", &[]);
        assert!(usage.message.unwrap().contains("i-0abc"));
    }

    #[test]
    fn test_client_rejects_bad_endpoint() {
        let result = CloudWatchClient::new(
            "not a url",
            "us-east-1",
            shared_utils::test_utils::test_aws_credentials(),
        );
        assert!(matches!(result, Err(UsageError::InvalidEndpoint(_))));
    }
}
