//! S3 client implementation

use super::config::S3Config;
use crate::protocol::{StoreConnector, StoreResult};
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::Client as AwsS3Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// S3 client for AWS S3 and S3-compatible storage such as Tigris
#[derive(Clone)]
pub struct S3Client {
    client: AwsS3Client,
    config: Arc<S3Config>,
}

impl S3Client {
    /// Create a new S3 client with the given configuration
    ///
    /// # Example
    ///
    /// ```no_run
    /// use model_sync::protocol::s3::{S3Client, S3Config};
    /// use std::sync::Arc;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let client = S3Client::new(Arc::new(S3Config::new())).await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: Arc<S3Config>) -> StoreResult<Self> {
        config.validate()?;
        let client = Self::build_aws_client(&config).await;
        Ok(Self { client, config })
    }

    /// Build the AWS SDK S3 client from configuration
    async fn build_aws_client(config: &S3Config) -> AwsS3Client {
        debug!(
            custom_endpoint = config.is_custom_endpoint(),
            explicit_credentials = config.has_explicit_credentials(),
            "Building S3 client"
        );
        let mut aws_config_loader = aws_config::defaults(BehaviorVersion::latest());

        let region_provider = if let Some(region_str) = &config.region {
            RegionProviderChain::first_try(Region::new(region_str.clone()))
        } else {
            RegionProviderChain::default_provider()
        };
        aws_config_loader = aws_config_loader.region(region_provider);

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            let credentials = Credentials::new(
                access_key,
                secret_key,
                config.session_token.clone(),
                None,
                "model-sync-explicit",
            );
            aws_config_loader = aws_config_loader.credentials_provider(credentials);
        }

        let aws_config = aws_config_loader.load().await;
        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&aws_config);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        // Required for MinIO, LocalStack
        if config.force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        if config.timeout_seconds > 0 {
            let timeout_config = aws_sdk_s3::config::timeout::TimeoutConfig::builder()
                .operation_timeout(Duration::from_secs(config.timeout_seconds))
                .build();
            s3_config_builder = s3_config_builder.timeout_config(timeout_config);
        }

        AwsS3Client::from_conf(s3_config_builder.build())
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Get a reference to the underlying AWS S3 client
    pub(crate) fn aws_client(&self) -> &AwsS3Client {
        &self.client
    }
}

/// Hands every worker its own `S3Client` built from one shared config
#[derive(Debug, Clone)]
pub struct S3Connector {
    config: Arc<S3Config>,
}

impl S3Connector {
    pub fn new(config: S3Config) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
        })
    }
}

#[async_trait]
impl StoreConnector for S3Connector {
    type Store = S3Client;

    async fn connect(&self) -> StoreResult<S3Client> {
        S3Client::new(self.config.clone()).await
    }
}
