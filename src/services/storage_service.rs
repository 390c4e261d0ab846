use anyhow::{Context, Result};
use aws_sdk_s3::{primitives::ByteStream, Client as S3Client};
use std::env;
use tracing::info;
use uuid::Uuid;

/// S3-compatible object storage for step images. Uploaded objects are
/// publicly readable; the returned URL goes straight into a step's
/// `image_url`.
pub struct StorageService {
    client: S3Client,
    bucket_name: String,
    endpoint_url: String,
}

impl StorageService {
    pub fn new(client: S3Client, bucket_name: String, endpoint_url: String) -> Self {
        Self {
            client,
            bucket_name,
            endpoint_url,
        }
    }

    /// Build from environment. Returns `None` when no bucket is configured,
    /// in which case image upload endpoints are disabled.
    pub async fn from_env() -> Option<Self> {
        let bucket_name = env::var("S3_BUCKET_NAME").ok()?;
        let endpoint_url = env::var("S3_ENDPOINT_URL")
            .unwrap_or_else(|_| "https://s3.amazonaws.com".to_string());

        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;
        let config = aws_sdk_s3::config::Builder::from(&shared)
            .endpoint_url(&endpoint_url)
            .force_path_style(true)
            .build();

        Some(Self::new(S3Client::from_conf(config), bucket_name, endpoint_url))
    }

    /// Key layout: `photos/{uuid}.{ext}`, extension taken from the original
    /// filename when it has one.
    pub fn generate_object_key(original_filename: &str) -> String {
        let unique_id = Uuid::new_v4();
        match original_filename.rsplit_once('.') {
            Some((_, extension)) if !extension.is_empty() => {
                format!("photos/{unique_id}.{extension}")
            }
            _ => format!("photos/{unique_id}"),
        }
    }

    pub async fn upload_image(
        &self,
        data: Vec<u8>,
        object_key: &str,
        content_type: &str,
    ) -> Result<String> {
        info!(
            "Uploading image: bucket={}, key={}, size={}",
            self.bucket_name,
            object_key,
            data.len()
        );

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(object_key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .context("Failed to upload image to object storage")?;

        Ok(self.public_url(object_key))
    }

    pub async fn delete_image(&self, object_key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(object_key)
            .send()
            .await
            .context("Failed to delete image from object storage")?;

        info!("Deleted image: {}", object_key);
        Ok(())
    }

    pub fn public_url(&self, object_key: &str) -> String {
        format!("{}/{}/{}", self.endpoint_url, self.bucket_name, object_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_keeps_extension() {
        let key = StorageService::generate_object_key("screenshot.png");
        assert!(key.starts_with("photos/"));
        assert!(key.ends_with(".png"));
    }

    #[test]
    fn test_object_key_without_extension() {
        let key = StorageService::generate_object_key("screenshot");
        assert!(key.starts_with("photos/"));
        assert!(!key.contains('.'));
    }

    #[test]
    fn test_object_keys_are_unique() {
        let a = StorageService::generate_object_key("a.jpg");
        let b = StorageService::generate_object_key("a.jpg");
        assert_ne!(a, b);
    }
}
