//! S3 driver built on aws-sdk-s3. Conditional writes use the `If-Match`
//! header, which S3 and most S3-compatible stores answer with 412 on a stale
//! entity tag.

use crate::storage::{ObjectStore, Precondition, StorageError, StoredObject};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;

/// Connection options for the S3 backend.
#[derive(Debug, Clone, Default)]
pub struct S3Config {
    /// Custom endpoint for S3-compatible stores (MinIO, rustfs, ...).
    pub endpoint_url: Option<String>,
    /// Falls back to the provider chain (`AWS_REGION`, profile) when unset.
    pub region: Option<String>,
    pub force_path_style: bool,
}

pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub async fn new(bucket: impl Into<String>, config: S3Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = config.region {
            loader = loader.region(Region::new(region));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.force_path_style);
        if let Some(endpoint) = config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        Self::from_client(Client::from_conf(builder.build()), bucket)
    }

    pub fn from_client(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

fn http_status<E>(err: &SdkError<E, HttpResponse>) -> Option<u16> {
    err.raw_response().map(|resp| resp.status().as_u16())
}

#[async_trait::async_trait]
impl ObjectStore for S3Store {
    async fn get_object(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match resp {
            Ok(output) => {
                let version = output.e_tag().map(str::to_string);
                let data = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| StorageError::Backend(format!("read body of {key}: {e}")))?
                    .into_bytes()
                    .to_vec();
                Ok(Some(StoredObject { data, version }))
            }
            Err(e) => {
                // Only a missing key means "absent"; NoSuchBucket and friends are real failures.
                let no_such_key = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);
                if no_such_key {
                    Ok(None)
                } else {
                    Err(StorageError::Backend(format!(
                        "get_object {key}: {}",
                        aws_sdk_s3::error::DisplayErrorContext(&e)
                    )))
                }
            }
        }
    }

    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        precondition: Precondition,
    ) -> Result<(), StorageError> {
        let mut req = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/json")
            .body(ByteStream::from(data));
        if let Precondition::IfMatch(etag) = precondition {
            req = req.if_match(etag);
        }

        match req.send().await {
            Ok(_) => Ok(()),
            // 409 is returned when a concurrent conditional write to the same key is in flight.
            Err(e) if matches!(http_status(&e), Some(412) | Some(409)) => {
                Err(StorageError::PreconditionFailed(key.to_string()))
            }
            Err(e) => Err(StorageError::Backend(format!(
                "put_object {key}: {}",
                aws_sdk_s3::error::DisplayErrorContext(&e)
            ))),
        }
    }
}
