//! Thin client for the Backblaze B2 native API.
//!
//! Covers exactly the calls one sync run needs: `b2_authorize_account`,
//! bucket resolution via `b2_list_buckets`, and `b2_get_upload_url` +
//! `b2_upload_file` per upload. B2 upload URLs are single-stream, so every
//! upload task fetches its own; the client itself holds no mutable state
//! and is shared by reference across the worker pool.
//!
//! The authorize endpoint is injectable so tests can point the client at a
//! local mock server.

use std::path::Path;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tracing::{error, info};

use crate::contract::{ObjectStore, StorageError};

/// Production endpoint for `b2_authorize_account`.
pub const B2_API_URL: &str = "https://api.backblazeb2.com";

/// Environment variable holding the application key id.
pub const KEY_ID_VAR: &str = "B2_KEY_ID";
/// Environment variable holding the application key.
pub const APP_KEY_VAR: &str = "B2_APP_KEY";

// B2 requires the file name header to be percent-encoded, with '/' kept
// literal so keys stay path-shaped.
const FILE_NAME_ENCODE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'+')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Account credentials for `b2_authorize_account`.
#[derive(Clone)]
pub struct Credentials {
    pub key_id: String,
    pub app_key: String,
}

// The application key must never reach a log line.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("key_id", &self.key_id)
            .field("app_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read credentials from the process environment. Both variables are
    /// required for any upload to succeed.
    pub fn from_env() -> Result<Self, StorageError> {
        let key_id = std::env::var(KEY_ID_VAR)
            .map_err(|_| StorageError::Auth(format!("{KEY_ID_VAR} is not set")))?;
        let app_key = std::env::var(APP_KEY_VAR)
            .map_err(|_| StorageError::Auth(format!("{APP_KEY_VAR} is not set")))?;
        Ok(Self { key_id, app_key })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizeAccount {
    account_id: String,
    authorization_token: String,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct ListBuckets {
    buckets: Vec<Bucket>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Bucket {
    bucket_id: String,
    bucket_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadSlot {
    upload_url: String,
    authorization_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// An authorized B2 session bound to one resolved bucket. Valid for the
/// lifetime of a single run.
#[derive(Debug)]
pub struct B2Client {
    http: reqwest::Client,
    api_url: String,
    auth_token: String,
    bucket_id: String,
}

impl B2Client {
    /// Authorize with credentials from `B2_KEY_ID` / `B2_APP_KEY` and
    /// resolve the named bucket against the production API.
    pub async fn connect_from_env(bucket_name: &str) -> Result<Self, StorageError> {
        let credentials = Credentials::from_env()?;
        Self::connect(B2_API_URL, &credentials, bucket_name).await
    }

    /// Authorize the account and resolve the bucket id by name. Both
    /// failures are configuration errors that abort the whole run.
    pub async fn connect(
        authorize_url: &str,
        credentials: &Credentials,
        bucket_name: &str,
    ) -> Result<Self, StorageError> {
        let http = reqwest::Client::new();

        let response = http
            .get(format!("{authorize_url}/b2api/v2/b2_authorize_account"))
            .basic_auth(&credentials.key_id, Some(&credentials.app_key))
            .send()
            .await?;
        if !response.status().is_success() {
            let detail = api_error_detail(response).await;
            error!(detail = %detail, "B2 account authorization rejected");
            return Err(StorageError::Auth(detail));
        }
        let auth: AuthorizeAccount = response.json().await?;
        info!("successfully authorized B2 account");

        let response = http
            .post(format!("{}/b2api/v2/b2_list_buckets", auth.api_url))
            .header(AUTHORIZATION, auth.authorization_token.as_str())
            .json(&serde_json::json!({
                "accountId": auth.account_id,
                "bucketName": bucket_name,
            }))
            .send()
            .await?;
        if !response.status().is_success() {
            let detail = api_error_detail(response).await;
            error!(bucket = bucket_name, detail = %detail, "bucket lookup failed");
            return Err(StorageError::BucketNotFound(bucket_name.to_string()));
        }
        let listing: ListBuckets = response.json().await?;
        let bucket = listing
            .buckets
            .into_iter()
            .find(|bucket| bucket.bucket_name == bucket_name)
            .ok_or_else(|| StorageError::BucketNotFound(bucket_name.to_string()))?;
        info!(bucket = %bucket.bucket_name, bucket_id = %bucket.bucket_id, "resolved bucket");

        Ok(Self {
            http,
            api_url: auth.api_url,
            auth_token: auth.authorization_token,
            bucket_id: bucket.bucket_id,
        })
    }

    async fn upload_slot(&self) -> Result<UploadSlot, StorageError> {
        let response = self
            .http
            .post(format!("{}/b2api/v2/b2_get_upload_url", self.api_url))
            .header(AUTHORIZATION, self.auth_token.as_str())
            .json(&serde_json::json!({ "bucketId": self.bucket_id }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(StorageError::Auth(api_error_detail(response).await));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ObjectStore for B2Client {
    async fn upload_file(&self, local: &Path, remote_key: &str) -> Result<(), StorageError> {
        let upload_err = |reason: String| StorageError::Upload {
            key: remote_key.to_string(),
            reason,
        };

        let body = tokio::fs::read(local)
            .await
            .map_err(|err| upload_err(format!("reading {}: {err}", local.display())))?;
        let content_sha1 = format!("{:x}", Sha1::digest(&body));

        let slot = self
            .upload_slot()
            .await
            .map_err(|err| upload_err(err.to_string()))?;

        let encoded_name = utf8_percent_encode(remote_key, FILE_NAME_ENCODE).to_string();
        let response = self
            .http
            .post(&slot.upload_url)
            .header(AUTHORIZATION, slot.authorization_token.as_str())
            .header("X-Bz-File-Name", encoded_name)
            .header("X-Bz-Content-Sha1", content_sha1)
            .header(reqwest::header::CONTENT_TYPE, "b2/x-auto")
            .body(body)
            .send()
            .await
            .map_err(|err| upload_err(err.to_string()))?;
        if !response.status().is_success() {
            return Err(upload_err(api_error_detail(response).await));
        }
        Ok(())
    }
}

async fn api_error_detail(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ApiError>().await {
        Ok(err) if !err.message.is_empty() => {
            format!("{status}: {} ({})", err.message, err.code)
        }
        _ => status.to_string(),
    }
}
