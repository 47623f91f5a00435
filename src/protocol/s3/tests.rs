//! Integration tests for the S3 protocol
//!
//! These tests require a running S3-compatible service (AWS S3, Tigris, MinIO, ...)
//! Set the following environment variables to run tests:
//!
//! - `S3_TEST_BUCKET`: Bucket name for testing
//! - `S3_TEST_REGION`: Region (default: us-east-1)
//! - `S3_TEST_ENDPOINT`: Custom endpoint for MinIO/LocalStack (optional)
//! - `AWS_ACCESS_KEY_ID`: Access key (optional, uses credential chain if not set)
//! - `AWS_SECRET_ACCESS_KEY`: Secret key (optional, uses credential chain if not set)
//! - `S3_TESTS_ENABLED`: Set to "1" to enable integration tests

use super::*;
use crate::protocol::{ObjectStore, StoreConnector};
use std::env;
use tempfile::tempdir;

/// Check if S3 integration tests should run
fn s3_tests_enabled() -> bool {
    env::var("S3_TESTS_ENABLED").unwrap_or_default() == "1"
}

fn test_bucket() -> String {
    env::var("S3_TEST_BUCKET").unwrap_or_else(|_| "model-sync-test-bucket".to_string())
}

/// Get test configuration from environment
fn get_test_config() -> S3Config {
    let mut config = S3Config::new();
    config.region = Some(env::var("S3_TEST_REGION").unwrap_or_else(|_| "us-east-1".to_string()));
    config.endpoint = env::var("S3_TEST_ENDPOINT").ok();
    config.access_key = env::var("AWS_ACCESS_KEY_ID").ok();
    config.secret_key = env::var("AWS_SECRET_ACCESS_KEY").ok();

    // Use path-style for MinIO/LocalStack
    if config.endpoint.is_some() {
        config.force_path_style = true;
    }

    config
}

#[tokio::test]
#[ignore]
async fn test_upload_list_download() {
    if !s3_tests_enabled() {
        println!("Skipping S3 integration test - set S3_TESTS_ENABLED=1 to run");
        return;
    }

    let bucket = test_bucket();
    let client = S3Connector::new(get_test_config())
        .expect("Invalid config")
        .connect()
        .await
        .expect("Failed to create client");

    let dir = tempdir().unwrap();
    let source = dir.path().join("weights.bin");
    std::fs::write(&source, b"Hello, S3!").unwrap();

    client
        .put_object_from_file(&source, &bucket, "model-sync-test/unet/weights.bin")
        .await
        .expect("Upload failed");

    let listing = client
        .list_objects(&bucket, "model-sync-test/", None)
        .await
        .expect("List failed");
    assert!(listing
        .keys
        .contains(&"model-sync-test/unet/weights.bin".to_string()));

    let dest = dir.path().join("downloaded.bin");
    client
        .get_object_to_file(&bucket, "model-sync-test/unet/weights.bin", &dest)
        .await
        .expect("Download failed");
    assert_eq!(std::fs::read(&dest).unwrap(), b"Hello, S3!");
}

#[tokio::test]
#[ignore]
async fn test_missing_key_is_not_found() {
    if !s3_tests_enabled() {
        return;
    }

    let client = S3Connector::new(get_test_config())
        .unwrap()
        .connect()
        .await
        .unwrap();
    let dir = tempdir().unwrap();

    let err = client
        .get_object_to_file(&test_bucket(), "model-sync-test/missing", &dir.path().join("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, crate::protocol::StoreError::NotFound { .. }));
}
