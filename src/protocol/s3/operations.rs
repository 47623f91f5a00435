//! `ObjectStore` implementation for `S3Client`

use super::client::S3Client;
use crate::protocol::{ObjectListing, ObjectStore, StoreError, StoreResult};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> StoreResult<ObjectListing> {
        let mut request = self
            .aws_client()
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix);

        if let Some(token) = continuation_token {
            request = request.continuation_token(token);
        }

        let response = request.send().await.map_err(StoreError::from)?;

        let keys = response
            .contents()
            .iter()
            .filter_map(|obj| obj.key().map(str::to_string))
            .collect();

        // Some S3-compatible stores set a token without the truncation flag
        let next_token = if response.is_truncated().unwrap_or(false) {
            response.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ObjectListing { keys, next_token })
    }

    async fn get_object_to_file(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
    ) -> StoreResult<()> {
        let response = self
            .aws_client()
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match StoreError::from(e) {
                StoreError::Service { code, .. } if code == "NoSuchKey" => StoreError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                },
                other => other,
            })?;

        // Stream the data to file
        let mut file = File::create(local_path).await?;
        let mut body = response.body;

        while let Some(bytes) = body
            .try_next()
            .await
            .map_err(|e| StoreError::Network(format!("Failed to read response body: {}", e)))?
        {
            file.write_all(&bytes).await?;
        }

        file.flush().await?;
        Ok(())
    }

    async fn put_object_from_file(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
    ) -> StoreResult<()> {
        let body = ByteStream::from_path(local_path).await.map_err(|e| {
            StoreError::Io(format!("Failed to open {}: {}", local_path.display(), e))
        })?;

        self.aws_client()
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(StoreError::from)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::s3::S3Config;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_client_implements_object_store() {
        let client = S3Client::new(Arc::new(S3Config::new())).await.unwrap();

        fn assert_impl<T: ObjectStore>(_: &T) {}
        assert_impl(&client);
    }
}
