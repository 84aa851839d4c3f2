use tracing::{debug, info, instrument, warn};

use crate::models::{InstanceIdentity, UsageError};
use crate::services::metadata::MetadataClient;

const INSTANCE_ID_PATH: &str = "/latest/meta-data/instance-id";

/// Looks up the instance id from the EC2 instance metadata service.
#[derive(Debug)]
pub struct InstanceIdentityResolver {
    metadata: MetadataClient,
}

impl InstanceIdentityResolver {
    pub fn new(endpoint: &str) -> Result<Self, UsageError> {
        Ok(Self::with_client(MetadataClient::new(endpoint)?))
    }

    pub fn with_client(metadata: MetadataClient) -> Self {
        Self { metadata }
    }

    /// Never fails: an unreachable metadata service falls back to
    /// `override_id`, and without one the identity stays unresolved.
    #[instrument(skip(self))]
    pub async fn resolve(&self, override_id: Option<&str>) -> InstanceIdentity {
        match self.metadata.get(INSTANCE_ID_PATH).await {
            Ok(instance_id) => {
                info!("Resolved instance ID {} from metadata service", instance_id);
                InstanceIdentity::from_metadata(instance_id)
            }
            Err(reason) => {
                debug!("Metadata lookup failed: {}", reason);
                match override_id.map(str::trim).filter(|id| !id.is_empty()) {
                    Some(instance_id) => {
                        info!("Using instance ID override {}", instance_id);
                        InstanceIdentity::from_override(instance_id)
                    }
                    None => {
                        warn!("Instance ID unresolved; /api/ec2-usage will return 503 until INSTANCE_ID is set");
                        InstanceIdentity::unresolved()
                    }
                }
            }
        }
    }
}
