//! Remote share-folder retrieval.
//!
//! Fetches candidate clips from a cloud drive folder shared by link: parse
//! the folder id out of the share URL, list the folder's video files over
//! the JSON API, and stream each one into a local staging directory.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{Result, SourceError};

/// A video file listed in a remote folder.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<RemoteFile>,
}

/// Extract the folder id from a share URL.
///
/// Accepts both shapes the drive hands out:
/// `…/drive/folders/<id>` and `…/drive?id=<id>`.
pub fn folder_id_from_url(url: &str) -> Result<String> {
    if let Some(rest) = url.split("folders/").nth(1) {
        let id = rest.split(['?', '/']).next().unwrap_or_default();
        if !id.is_empty() {
            return Ok(id.to_string());
        }
    }
    if let Some(rest) = url.split("id=").nth(1) {
        let id = rest.split('&').next().unwrap_or_default();
        if !id.is_empty() {
            return Ok(id.to_string());
        }
    }
    Err(SourceError::InvalidShareUrl { url: url.to_string() }.into())
}

/// API client for a drive-style share folder.
pub struct ShareFolderClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl ShareFolderClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http: reqwest::Client::new(),
        }
    }

    /// List the video files in a folder.
    pub async fn list_videos(&self, folder_id: &str) -> Result<Vec<RemoteFile>> {
        let query = format!("'{folder_id}' in parents and mimeType contains 'video/'");
        let response = self
            .http
            .get(format!("{}/files", self.base_url))
            .query(&[
                ("q", query.as_str()),
                ("pageSize", "100"),
                ("fields", "files(id, name, mimeType)"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SourceError::ShareRequestFailed { reason: e.to_string() })?;

        if !response.status().is_success() {
            return Err(SourceError::ShareRequestFailed {
                reason: format!("listing returned {}", response.status()),
            }
            .into());
        }

        let list: FileList = response
            .json()
            .await
            .map_err(|e| SourceError::ShareRequestFailed { reason: e.to_string() })?;

        debug!(folder = folder_id, files = list.files.len(), "listed share folder");
        Ok(list.files)
    }

    /// Stream one file into `dest_dir`, named as it is named remotely.
    pub async fn download(&self, file: &RemoteFile, dest_dir: &Path) -> Result<PathBuf> {
        let response = self
            .http
            .get(format!("{}/files/{}", self.base_url, file.id))
            .query(&[("alt", "media"), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| SourceError::DownloadFailed { name: file.name.clone(), reason: e.to_string() })?;

        if !response.status().is_success() {
            return Err(SourceError::DownloadFailed {
                name: file.name.clone(),
                reason: format!("download returned {}", response.status()),
            }
            .into());
        }

        let dest = dest_dir.join(&file.name);
        let mut writer = tokio::fs::File::create(&dest).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| SourceError::DownloadFailed {
                name: file.name.clone(),
                reason: e.to_string(),
            })?;
            writer.write_all(&chunk).await?;
        }
        writer.flush().await?;

        debug!(name = %file.name, dest = %dest.display(), "downloaded clip");
        Ok(dest)
    }

    /// Fetch every video in a shared folder into `dest_dir`.
    ///
    /// Individual download failures are skipped with a warning; the call
    /// fails only when nothing could be fetched at all.
    pub async fn fetch_folder(&self, share_url: &str, dest_dir: &Path) -> Result<Vec<PathBuf>> {
        let folder_id = folder_id_from_url(share_url)?;
        let files = self.list_videos(&folder_id).await?;
        if files.is_empty() {
            return Err(SourceError::NoClipsFound { path: share_url.to_string() }.into());
        }

        tokio::fs::create_dir_all(dest_dir).await?;
        let mut downloaded = Vec::with_capacity(files.len());
        for file in &files {
            match self.download(file, dest_dir).await {
                Ok(path) => downloaded.push(path),
                Err(e) => warn!(name = %file.name, "skipping failed download: {e}"),
            }
        }

        if downloaded.is_empty() {
            return Err(SourceError::ShareRequestFailed {
                reason: "failed to download any video files".to_string(),
            }
            .into());
        }
        info!(count = downloaded.len(), "fetched clips from share folder");
        Ok(downloaded)
    }
}
