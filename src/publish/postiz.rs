//! Posting-service client.
//!
//! The service fronts the social platforms: we upload the finished reel,
//! point a scheduled post at the platform integration, and poll its status.
//! No platform OAuth happens in this crate.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{PublishError, Result};

const DEFAULT_BASE_URL: &str = "https://api.postiz.com/public/v1";

/// A connected social account on the posting service.
#[derive(Debug, Clone, Deserialize)]
pub struct Integration {
    pub id: String,
    pub identifier: String,
    #[serde(default)]
    pub name: String,
}

/// An uploaded media object.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedMedia {
    pub id: String,
    #[serde(default)]
    pub path: String,
}

/// A scheduled (or published) post.
#[derive(Debug, Clone, Deserialize)]
pub struct PostStatus {
    pub id: String,
    #[serde(default)]
    pub state: String,
}

/// API-key-authenticated client for the posting service.
pub struct PostingClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl PostingClient {
    /// Build a client reading the API key from `POSTIZ_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("POSTIZ_API_KEY")
            .map_err(|_| PublishError::MissingCredential { env_var: "POSTIZ_API_KEY".to_string() })?;
        Ok(Self::new(DEFAULT_BASE_URL, api_key))
    }

    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http: reqwest::Client::new(),
        }
    }

    /// List the connected social integrations.
    pub async fn integrations(&self) -> Result<Vec<Integration>> {
        let response = self
            .http
            .get(format!("{}/integrations", self.base_url))
            .header("Authorization", &self.api_key)
            .send()
            .await
            .map_err(|e| PublishError::ScheduleFailed { reason: e.to_string() })?;

        if !response.status().is_success() {
            return Err(PublishError::ScheduleFailed {
                reason: format!("integrations returned {}", response.status()),
            }
            .into());
        }

        response
            .json()
            .await
            .map_err(|e| PublishError::ScheduleFailed { reason: e.to_string() }.into())
    }

    /// Resolve the integration id for a platform, e.g. `tiktok`.
    pub async fn integration_id(&self, platform: &str) -> Result<String> {
        let integrations = self.integrations().await?;
        integrations
            .into_iter()
            .find(|i| i.identifier == platform)
            .map(|i| i.id)
            .ok_or_else(|| PublishError::IntegrationMissing { platform: platform.to_string() }.into())
    }

    /// Upload a finished video as a multipart form.
    pub async fn upload_media(&self, path: impl AsRef<Path>) -> Result<UploadedMedia> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.mp4")
            .to_string();

        debug!(file = %file_name, bytes = bytes.len(), "uploading media");
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("video/mp4")
            .map_err(|e| PublishError::UploadFailed { reason: e.to_string() })?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/upload", self.base_url))
            .header("Authorization", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PublishError::UploadFailed { reason: e.to_string() })?;

        if !response.status().is_success() {
            return Err(PublishError::UploadFailed {
                reason: format!("upload returned {}", response.status()),
            }
            .into());
        }

        response
            .json()
            .await
            .map_err(|e| PublishError::UploadFailed { reason: e.to_string() }.into())
    }

    /// Schedule a post carrying the uploaded media.
    ///
    /// Defaults to five minutes out when no time is given, leaving the
    /// service room to process the upload first.
    pub async fn schedule_post(
        &self,
        integration_id: &str,
        media_id: &str,
        caption: &str,
        schedule_at: Option<DateTime<Utc>>,
    ) -> Result<PostStatus> {
        let date = schedule_at.unwrap_or_else(|| Utc::now() + Duration::minutes(5));
        let body = json!({
            "type": "schedule",
            "date": date.to_rfc3339(),
            "shortLink": false,
            "tags": [],
            "posts": [{
                "integration": { "id": integration_id },
                "value": [{
                    "content": caption,
                    "media": media_id,
                }],
            }],
        });

        let response = self
            .http
            .post(format!("{}/posts", self.base_url))
            .header("Authorization", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PublishError::ScheduleFailed { reason: e.to_string() })?;

        if !response.status().is_success() {
            return Err(PublishError::ScheduleFailed {
                reason: format!("scheduling returned {}", response.status()),
            }
            .into());
        }

        // The service answers with either a single post or an array of them.
        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PublishError::ScheduleFailed { reason: e.to_string() })?;
        let post_value = match &value {
            serde_json::Value::Array(items) => items.first().cloned().ok_or_else(|| {
                PublishError::ScheduleFailed { reason: "empty scheduling response".to_string() }
            })?,
            _ => value,
        };

        let status: PostStatus = serde_json::from_value(post_value)
            .map_err(|e| PublishError::ScheduleFailed { reason: e.to_string() })?;
        info!(post = %status.id, at = %date.to_rfc3339(), "post scheduled");
        Ok(status)
    }

    /// Fetch the current status of a post.
    pub async fn post_status(&self, post_id: &str) -> Result<PostStatus> {
        let response = self
            .http
            .get(format!("{}/posts/{post_id}", self.base_url))
            .header("Authorization", &self.api_key)
            .send()
            .await
            .map_err(|e| PublishError::StatusFailed { post_id: post_id.to_string(), reason: e.to_string() })?;

        if !response.status().is_success() {
            return Err(PublishError::StatusFailed {
                post_id: post_id.to_string(),
                reason: format!("status returned {}", response.status()),
            }
            .into());
        }

        response.json().await.map_err(|e| {
            PublishError::StatusFailed { post_id: post_id.to_string(), reason: e.to_string() }.into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn integration_id_matches_on_identifier() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/integrations")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"id": "int-1", "identifier": "instagram", "name": "IG"},
                    {"id": "int-2", "identifier": "tiktok", "name": "TT"}
                ]"#,
            )
            .create_async()
            .await;

        let client = PostingClient::new(server.url(), "key");
        assert_eq!(client.integration_id("tiktok").await.unwrap(), "int-2");
        assert!(client.integration_id("youtube").await.is_err());
    }

    #[tokio::test]
    async fn upload_parses_the_media_id() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/upload")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "media-9", "path": "/uploads/media-9.mp4"}"#)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let video = dir.path().join("reel.mp4");
        std::fs::write(&video, b"bytes").unwrap();

        let client = PostingClient::new(server.url(), "key");
        let media = client.upload_media(&video).await.unwrap();

        assert_eq!(media.id, "media-9");
    }

    #[tokio::test]
    async fn scheduling_accepts_array_responses() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/posts")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": "post-5", "state": "QUEUE"}]"#)
            .create_async()
            .await;

        let client = PostingClient::new(server.url(), "key");
        let status = client.schedule_post("int-2", "media-9", "caption", None).await.unwrap();

        assert_eq!(status.id, "post-5");
        assert_eq!(status.state, "QUEUE");
    }

    #[tokio::test]
    async fn status_errors_carry_the_post_id() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/posts/post-5").with_status(500).create_async().await;

        let client = PostingClient::new(server.url(), "key");
        let err = client.post_status("post-5").await.unwrap_err();

        assert!(err.to_string().contains("post-5"));
    }
}
