//! S3 store operations (initiate, parts, complete, abort, simple PUT)

use async_trait::async_trait;
use aws_config::Region;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use serde::{Deserialize, Serialize};

use super::{ObjectMeta, ObjectStore};
use crate::checkpoint::PartResult;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub endpoint_url: Option<String>,
    pub bucket: String,
    #[serde(default)]
    pub force_path_style: bool,
}

impl S3Config {
    /// Configuration for a Cloudflare R2 bucket
    pub fn r2(
        account_id: &str,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: "auto".to_string(),
            endpoint_url: Some(format!("https://{}.r2.cloudflarestorage.com", account_id)),
            bucket: bucket.into(),
            force_path_style: true,
        }
    }
}

/// Create an S3 client with static credentials and an optional custom endpoint
pub fn create_s3_client(config: &S3Config) -> Client {
    let credentials = Credentials::new(
        &config.access_key_id,
        &config.secret_access_key,
        None,
        None,
        "resumable-upload",
    );

    let mut builder = S3ConfigBuilder::new()
        .credentials_provider(credentials)
        .region(Region::new(config.region.clone()));

    if let Some(endpoint_url) = &config.endpoint_url {
        builder = builder.endpoint_url(endpoint_url);
    }

    if config.force_path_style {
        builder = builder.force_path_style(true);
    }

    Client::from_conf(builder.build())
}

/// Timeouts and connection failures may succeed on a second try; answers from
/// the service will not.
fn classify<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    let retryable = matches!(
        err,
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_)
    );

    let mut message = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    if retryable {
        StoreError::Transport(message)
    } else {
        StoreError::Rejected(message)
    }
}

pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(config: &S3Config) -> Self {
        Self {
            client: create_s3_client(config),
            bucket: config.bucket.clone(),
        }
    }

    pub fn from_client(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn initiate(&self, object_key: &str, meta: &ObjectMeta) -> StoreResult<String> {
        let mut request = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(object_key)
            .content_type(meta.content_type());

        for (k, v) in &meta.metadata {
            request = request.metadata(k, v);
        }

        let response = request.send().await.map_err(classify)?;
        let upload_id = response
            .upload_id()
            .ok_or(StoreError::MissingField("UploadId"))?
            .to_string();

        Ok(upload_id)
    }

    async fn upload_part(
        &self,
        object_key: &str,
        upload_id: &str,
        part_number: u32,
        data: Vec<u8>,
    ) -> StoreResult<String> {
        let body = ByteStream::from(data);

        let response = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(object_key)
            .upload_id(upload_id)
            .part_number(part_number as i32)
            .body(body)
            .send()
            .await
            .map_err(classify)?;

        let etag = response
            .e_tag()
            .ok_or(StoreError::MissingField("ETag"))?
            .to_string();
        Ok(etag)
    }

    async fn complete_upload(
        &self,
        object_key: &str,
        upload_id: &str,
        parts: &[PartResult],
    ) -> StoreResult<Option<String>> {
        let mut parts = parts.to_vec();
        // Sort parts by part number (required by S3/R2)
        parts.sort_by_key(|p| p.number);

        let completed_parts: Vec<CompletedPart> = parts
            .into_iter()
            .map(|part| {
                CompletedPart::builder()
                    .part_number(part.number as i32)
                    .e_tag(part.integrity_tag)
                    .build()
            })
            .collect();

        let completed_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(completed_parts))
            .build();

        let response = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(object_key)
            .upload_id(upload_id)
            .multipart_upload(completed_upload)
            .send()
            .await
            .map_err(classify)?;

        Ok(response.e_tag().map(|e| e.to_string()))
    }

    async fn abort_upload(&self, object_key: &str, upload_id: &str) -> StoreResult<()> {
        self.client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(object_key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(classify)?;

        Ok(())
    }

    async fn put_object(
        &self,
        object_key: &str,
        data: Vec<u8>,
        meta: &ObjectMeta,
    ) -> StoreResult<Option<String>> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(object_key)
            .content_type(meta.content_type())
            .body(ByteStream::from(data));

        for (k, v) in &meta.metadata {
            request = request.metadata(k, v);
        }

        let response = request.send().await.map_err(classify)?;
        Ok(response.e_tag().map(|e| e.to_string()))
    }
}
