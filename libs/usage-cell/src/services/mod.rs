pub mod cloudwatch;
pub mod credentials;
pub mod identity;
pub mod metadata;

pub use cloudwatch::CloudWatchClient;
pub use credentials::{CredentialProvider, InstanceProfileCredentials};
pub use identity::InstanceIdentityResolver;
pub use metadata::MetadataClient;
