//! Mapping from AWS SDK errors to `StoreError`

use crate::protocol::StoreError;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};

/// Convert AWS SDK errors to StoreError
impl<E> From<SdkError<E>> for StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    fn from(error: SdkError<E>) -> Self {
        match &error {
            SdkError::DispatchFailure(e) => {
                StoreError::Network(format!("Network dispatch failure: {:?}", e))
            }
            SdkError::TimeoutError(_) => StoreError::Network("Request timed out".to_string()),
            SdkError::ResponseError(e) => {
                StoreError::Network(format!("Response error: {:?}", e))
            }
            SdkError::ServiceError(_) => {
                let code = error.code().unwrap_or("Unknown").to_string();
                let message = error.message().unwrap_or_default().to_string();
                service_error(code, message)
            }
            _ => StoreError::Sdk(format!("{:?}", error)),
        }
    }
}

/// Classify a service error by its S3 error code
pub(crate) fn service_error(code: String, message: String) -> StoreError {
    match code.as_str() {
        "NoSuchBucket" => StoreError::BucketNotFound(message),
        "AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" => {
            StoreError::AccessDenied(format!("{}: {}", code, message))
        }
        _ => StoreError::Service { code, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_classification() {
        assert!(matches!(
            service_error("NoSuchBucket".to_string(), "models".to_string()),
            StoreError::BucketNotFound(_)
        ));
        assert!(matches!(
            service_error("SignatureDoesNotMatch".to_string(), String::new()),
            StoreError::AccessDenied(_)
        ));
        match service_error("SlowDown".to_string(), "rate".to_string()) {
            StoreError::Service { code, message } => {
                assert_eq!(code, "SlowDown");
                assert_eq!(message, "rate");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
