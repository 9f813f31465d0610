//! HLS playlist download for video redundancy.
//!
//! A master playlist lists variant playlists. Each variant lists its media
//! segments, and fragmented MP4 variants also reference an init section
//! through `#EXT-X-MAP:URI="..."`. Every referenced file is stored flat in
//! the destination directory under its original file name.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use peertube_common::{AppError, AppResult};
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::retry::RetryPolicy;

/// Downloads a streaming playlist and everything it references.
#[async_trait]
pub trait PlaylistDownloader: Send + Sync {
    /// Download `master_url` into `dest`, failing when more than `max_bytes` would be written.
    ///
    /// Returns the number of bytes written.
    async fn download(&self, master_url: &Url, dest: &Path, max_bytes: u64) -> AppResult<u64>;
}

/// URIs referenced by a playlist, in order of first appearance.
#[must_use]
pub fn parse_playlist_uris(body: &str) -> Vec<String> {
    let mut uris: Vec<String> = Vec::new();

    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let uri = if line.starts_with('#') {
            attribute_uri(line)
        } else {
            Some(line)
        };

        if let Some(uri) = uri {
            if !uris.iter().any(|u| u == uri) {
                uris.push(uri.to_string());
            }
        }
    }

    uris
}

fn attribute_uri(tag: &str) -> Option<&str> {
    let start = tag.find("URI=\"")? + "URI=\"".len();
    let len = tag[start..].find('"')?;

    Some(&tag[start..start + len])
}

/// Add `len` bytes to `written`, failing once the total exceeds `max_bytes`.
fn charge(written: &mut u64, len: u64, max_bytes: u64) -> AppResult<()> {
    *written = written.saturating_add(len);

    if *written > max_bytes {
        return Err(AppError::BadRequest(format!(
            "Playlist exceeds the maximum size of {max_bytes} bytes"
        )));
    }

    Ok(())
}

/// Write a playlist body to `path`, charging it to the download budget first.
async fn store_playlist(path: &Path, body: &str, written: &mut u64, max_bytes: u64) -> AppResult<()> {
    charge(written, body.len() as u64, max_bytes)?;

    tokio::fs::write(path, body)
        .await
        .map_err(|e| AppError::Internal(format!("Cannot write {}: {e}", path.display())))
}

/// Last path segment of `url`, used as the local file name.
#[must_use]
pub fn file_name_of(url: &Url) -> Option<&str> {
    url.path_segments()?
        .next_back()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
}

/// Downloads HLS playlists over HTTP.
#[derive(Clone)]
pub struct HlsDownloader {
    http_client: Client,
    timeout: Duration,
    retry: RetryPolicy,
}

impl HlsDownloader {
    /// Create a downloader giving up on a whole playlist after `timeout`.
    pub fn new(user_agent: &str, timeout: Duration) -> AppResult<Self> {
        let http_client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            timeout,
            retry: RetryPolicy::default(),
        })
    }

    async fn fetch_text(&self, url: &Url) -> AppResult<String> {
        let client = &self.http_client;

        self.retry
            .run(move || async move {
                let response = client
                    .get(url.clone())
                    .send()
                    .await
                    .and_then(reqwest::Response::error_for_status)
                    .map_err(|e| AppError::ExternalService(format!("{url}: {e}")))?;

                response
                    .text()
                    .await
                    .map_err(|e| AppError::ExternalService(format!("{url}: {e}")))
            })
            .await
    }

    /// Stream `url` into `path`, adding the written bytes to `written`.
    async fn fetch_file(
        &self,
        url: &Url,
        path: &Path,
        written: &mut u64,
        max_bytes: u64,
    ) -> AppResult<()> {
        let client = &self.http_client;

        let response = self
            .retry
            .run(move || async move {
                client
                    .get(url.clone())
                    .send()
                    .await
                    .and_then(reqwest::Response::error_for_status)
                    .map_err(|e| AppError::ExternalService(format!("{url}: {e}")))
            })
            .await?;

        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| AppError::Internal(format!("Cannot create {}: {e}", path.display())))?;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| AppError::ExternalService(format!("{url}: {e}")))?;

            charge(written, chunk.len() as u64, max_bytes)?;

            file.write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Cannot write {}: {e}", path.display())))?;
        }

        file.flush()
            .await
            .map_err(|e| AppError::Internal(format!("Cannot write {}: {e}", path.display())))
    }

    async fn save_playlist(
        &self,
        url: &Url,
        dest: &Path,
        written: &mut u64,
        max_bytes: u64,
    ) -> AppResult<String> {
        let body = self.fetch_text(url).await?;
        let path = local_path(dest, url)?;

        store_playlist(&path, &body, written, max_bytes).await?;
        Ok(body)
    }

    async fn download_all(&self, master_url: &Url, dest: &Path, max_bytes: u64) -> AppResult<u64> {
        tokio::fs::create_dir_all(dest)
            .await
            .map_err(|e| AppError::Internal(format!("Cannot create {}: {e}", dest.display())))?;

        let mut written = 0;
        let master = self
            .save_playlist(master_url, dest, &mut written, max_bytes)
            .await?;

        for variant in parse_playlist_uris(&master) {
            let variant_url = resolve(master_url, &variant)?;
            let body = self
                .save_playlist(&variant_url, dest, &mut written, max_bytes)
                .await?;

            for segment in parse_playlist_uris(&body) {
                let segment_url = resolve(&variant_url, &segment)?;
                let path = local_path(dest, &segment_url)?;

                let exists = tokio::fs::try_exists(&path)
                    .await
                    .map_err(|e| AppError::Internal(format!("Cannot access {}: {e}", path.display())))?;
                if exists {
                    continue;
                }

                tracing::debug!(url = %segment_url, "Downloading playlist segment");
                self.fetch_file(&segment_url, &path, &mut written, max_bytes)
                    .await?;
            }
        }

        Ok(written)
    }
}

#[async_trait]
impl PlaylistDownloader for HlsDownloader {
    async fn download(&self, master_url: &Url, dest: &Path, max_bytes: u64) -> AppResult<u64> {
        tracing::info!(url = %master_url, dest = %dest.display(), "Downloading streaming playlist");

        let result = tokio::time::timeout(self.timeout, self.download_all(master_url, dest, max_bytes))
            .await
            .unwrap_or_else(|_| {
                Err(AppError::ExternalService(format!(
                    "Download of {master_url} timed out"
                )))
            });

        if result.is_err() {
            if let Err(e) = tokio::fs::remove_dir_all(dest).await {
                tracing::warn!(error = %e, dest = %dest.display(), "Cannot clean up partial download");
            }
        }

        result
    }
}

fn resolve(base: &Url, uri: &str) -> AppResult<Url> {
    base.join(uri)
        .map_err(|e| AppError::ExternalService(format!("Invalid playlist URI {uri}: {e}")))
}

fn local_path(dest: &Path, url: &Url) -> AppResult<PathBuf> {
    file_name_of(url)
        .map(|name| dest.join(name))
        .ok_or_else(|| AppError::ExternalService(format!("No file name in {url}")))
}
