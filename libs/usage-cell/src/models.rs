// =====================================================================================
// USAGE CELL MODELS
// =====================================================================================

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

pub const UNAVAILABLE: &str = "N/A";

pub const FREE_TIER_MESSAGE: &str = "Free tier usage is not computed by this dashboard. \
    Check the AWS Billing console (Free Tier page) for current usage against free tier limits.";

// =====================================================================================
// INSTANCE IDENTITY
// =====================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    Metadata,
    Override,
    Unresolved,
}

/// Identifier of the compute instance this process runs on, resolved once at
/// startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceIdentity {
    instance_id: Option<String>,
    source: IdentitySource,
}

impl InstanceIdentity {
    pub fn from_metadata(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: Some(instance_id.into()),
            source: IdentitySource::Metadata,
        }
    }

    pub fn from_override(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: Some(instance_id.into()),
            source: IdentitySource::Override,
        }
    }

    pub fn unresolved() -> Self {
        Self {
            instance_id: None,
            source: IdentitySource::Unresolved,
        }
    }

    pub fn instance_id(&self) -> Option<&str> {
        self.instance_id.as_deref()
    }

    pub fn source(&self) -> IdentitySource {
        self.source
    }

    pub fn is_resolved(&self) -> bool {
        self.instance_id.is_some()
    }
}

// =====================================================================================
// METRICS
// =====================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    CpuUtilization,
    NetworkIn,
    NetworkOut,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [
        MetricKind::CpuUtilization,
        MetricKind::NetworkIn,
        MetricKind::NetworkOut,
    ];

    /// Query id used in GetMetricData requests.
    pub fn query_id(self) -> &'static str {
        match self {
            MetricKind::CpuUtilization => "cpu",
            MetricKind::NetworkIn => "network_in",
            MetricKind::NetworkOut => "network_out",
        }
    }

    pub fn from_query_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.query_id() == id)
    }

    /// CloudWatch metric name, also the JSON key of the value.
    pub fn metric_name(self) -> &'static str {
        match self {
            MetricKind::CpuUtilization => "CPUUtilization",
            MetricKind::NetworkIn => "NetworkIn",
            MetricKind::NetworkOut => "NetworkOut",
        }
    }

    pub fn statistic(self) -> &'static str {
        match self {
            MetricKind::CpuUtilization => "Average",
            MetricKind::NetworkIn | MetricKind::NetworkOut => "Sum",
        }
    }

    pub fn timestamp_key(self) -> &'static str {
        match self {
            MetricKind::CpuUtilization => "CPUTimestamp",
            MetricKind::NetworkIn => "NetworkInTimestamp",
            MetricKind::NetworkOut => "NetworkOutTimestamp",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetricReading {
    Value { value: f64, timestamp: DateTime<Utc> },
    Unavailable,
}

impl MetricReading {
    /// Picks the most recent datapoint. Timestamps and values are paired by index.
    pub fn latest(timestamps: &[DateTime<Utc>], values: &[f64]) -> Self {
        timestamps
            .iter()
            .zip(values.iter())
            .max_by_key(|(timestamp, _)| **timestamp)
            .map(|(timestamp, value)| MetricReading::Value {
                value: *value,
                timestamp: *timestamp,
            })
            .unwrap_or(MetricReading::Unavailable)
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            MetricReading::Value { value, .. } => Some(*value),
            MetricReading::Unavailable => None,
        }
    }
}

/// Latest CPU and network figures for one instance.
///
/// Serializes to the flat shape the dashboard reads: each metric contributes a
/// value key and a timestamp key, both `"N/A"` when CloudWatch had no datapoint.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceUsage {
    pub instance_id: String,
    pub cpu_utilization: MetricReading,
    pub network_in: MetricReading,
    pub network_out: MetricReading,
    pub message: Option<String>,
}

impl InstanceUsage {
    pub fn reading(&self, kind: MetricKind) -> &MetricReading {
        match kind {
            MetricKind::CpuUtilization => &self.cpu_utilization,
            MetricKind::NetworkIn => &self.network_in,
            MetricKind::NetworkOut => &self.network_out,
        }
    }
}

impl Serialize for InstanceUsage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = 1 + MetricKind::ALL.len() * 2 + usize::from(self.message.is_some());
        let mut map = serializer.serialize_map(Some(len))?;

        map.serialize_entry("InstanceID", &self.instance_id)?;
        for kind in MetricKind::ALL {
            match self.reading(kind) {
                MetricReading::Value { value, timestamp } => {
                    map.serialize_entry(kind.metric_name(), value)?;
                    map.serialize_entry(
                        kind.timestamp_key(),
                        &timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                    )?;
                }
                MetricReading::Unavailable => {
                    map.serialize_entry(kind.metric_name(), UNAVAILABLE)?;
                    map.serialize_entry(kind.timestamp_key(), UNAVAILABLE)?;
                }
            }
        }
        if let Some(message) = &self.message {
            map.serialize_entry("message", message)?;
        }

        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeTierNotice {
    pub message: String,
}

impl FreeTierNotice {
    pub fn current() -> Self {
        Self {
            message: FREE_TIER_MESSAGE.to_string(),
        }
    }
}

// =====================================================================================
// CLOUDWATCH WIRE TYPES (GetMetricData, AWS JSON 1.0)
// =====================================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetMetricDataRequest<'a> {
    pub metric_data_queries: &'a [MetricDataQuery],
    pub start_time: i64,
    pub end_time: i64,
    pub scan_by: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDataQuery {
    pub id: &'static str,
    pub metric_stat: MetricStat,
    pub return_data: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricStat {
    pub metric: Metric,
    pub period: u32,
    pub stat: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Metric {
    pub namespace: &'static str,
    pub metric_name: &'static str,
    pub dimensions: Vec<Dimension>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dimension {
    pub name: &'static str,
    pub value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetMetricDataResponse {
    #[serde(default)]
    pub metric_data_results: Vec<MetricDataResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDataResult {
    pub id: String,
    /// Epoch seconds.
    #[serde(default)]
    pub timestamps: Vec<f64>,
    #[serde(default)]
    pub values: Vec<f64>,
    #[serde(default)]
    pub status_code: Option<String>,
}

impl MetricDataResult {
    /// CloudWatch returns `PartialData` when more datapoints exist than it sent.
    pub fn is_partial(&self) -> bool {
        self.status_code.as_deref() == Some("PartialData")
    }
}

// =====================================================================================
// INSTANCE PROFILE CREDENTIALS (metadata service)
// =====================================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceProfileCredentialsResponse {
    #[serde(default)]
    pub code: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub token: Option<String>,
    pub expiration: DateTime<Utc>,
}

// =====================================================================================
// ERRORS
// =====================================================================================

#[derive(Error, Debug)]
pub enum UsageError {
    #[error("instance ID could not be determined (no metadata endpoint and INSTANCE_ID not set)")]
    IdentityMissing,

    #[error("CloudWatch request failed: {0}")]
    Remote(String),

    #[error("AWS credentials unavailable: {0}")]
    Credentials(String),

    #[error("invalid endpoint {0}")]
    InvalidEndpoint(String),

    #[error("internal error: {0}")]
    Internal(String),
}
