// =====================================================================================
// USAGE CELL - EC2 INSTANCE USAGE FROM CLOUDWATCH
// =====================================================================================
//
// This cell provides:
// - Instance identity resolution (EC2 metadata service, INSTANCE_ID override)
// - CloudWatch CPU / network metrics for the resolved instance
// - AWS credentials from static keys or the instance profile role
// - A static free tier notice
//
// Routes (nested under /api by the API app):
// - GET /ec2-usage
// - GET /free-tier-usage
//
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

// Re-export commonly used types
pub use models::{
    FreeTierNotice, IdentitySource, InstanceIdentity, InstanceUsage, MetricKind, MetricReading,
    UsageError,
};

pub use services::{
    CloudWatchClient, CredentialProvider, InstanceIdentityResolver, InstanceProfileCredentials,
    MetadataClient,
};

pub use handlers::UsageState;
pub use router::usage_routes;
