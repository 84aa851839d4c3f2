pub mod aws_sigv4;
pub mod test_utils;

pub use aws_sigv4::{AwsCredentials, SignableRequest, SignedHeaders, SigningError};
