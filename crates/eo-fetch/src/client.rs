//! Download collaborators: the narrow interfaces the fetch task consumes.
//!
//! The processing API itself is vendor glue. The task only needs two
//! capabilities: post a batch of prepared payloads and get back decoded
//! response parts, and list the acquisition times available over an area.
//! Both are traits so tests and alternative providers can stand in.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::header;
use serde_json::Value as JsonValue;
use tracing::debug;

use eo_common::{PatchBounds, TimeInterval};
use eo_patch::NdArray;

use crate::error::{FetchError, Result};

/// Output mime types understood by the processing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeType {
    Tar,
    Json,
    Tiff,
    Png,
}

impl MimeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MimeType::Tar => "application/x-tar",
            MimeType::Json => "application/json",
            MimeType::Tiff => "image/tiff",
            MimeType::Png => "image/png",
        }
    }
}

/// One prepared request against the processing endpoint.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub payload: JsonValue,
    pub mime_type: MimeType,
    /// Stable identifier a caching client may key stored responses by.
    pub cache_key: Option<String>,
}

/// One decoded part of a multi-part response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePart {
    /// A decoded image buffer, height x width (x channels).
    Image(NdArray),
    /// The JSON user-data side channel.
    UserData(JsonValue),
}

/// Decoded response parts keyed by output identifier.
pub type ResponseBundle = BTreeMap<String, ResponsePart>;

/// Executes prepared download requests.
#[async_trait]
pub trait DownloadClient: Send + Sync {
    /// Execute one request and decode its parts.
    async fn download(&self, request: &DownloadRequest) -> Result<ResponseBundle>;

    /// Execute a batch with bounded concurrency, preserving input order.
    ///
    /// Any single failure fails the whole batch.
    async fn download_all(
        &self,
        requests: &[DownloadRequest],
        max_concurrency: usize,
    ) -> Result<Vec<ResponseBundle>> {
        let downloads: Vec<_> = requests
            .iter()
            .map(|request| self.download(request))
            .collect();
        stream::iter(downloads)
            .buffered(max_concurrency.max(1))
            .try_collect()
            .await
    }
}

/// Lists the acquisition times available for an area and interval.
#[async_trait]
pub trait SceneCatalog: Send + Sync {
    /// Acquisition timestamps intersecting `bounds` within `interval`,
    /// filtered by maximum cloud coverage (fractional, 0-1).
    async fn scene_timestamps(
        &self,
        bounds: &PatchBounds,
        interval: &TimeInterval,
        maxcc: f64,
    ) -> Result<Vec<DateTime<Utc>>>;
}

/// Decodes a provider response body into named parts.
///
/// Archive unpacking and image decoding are provider-specific; the client
/// stays agnostic by delegating to this hook.
pub type ResponseDecoder =
    dyn Fn(&DownloadRequest, &[u8]) -> Result<ResponseBundle> + Send + Sync;

/// reqwest-backed client posting JSON payloads.
pub struct HttpDownloadClient {
    http: reqwest::Client,
    decoder: Arc<ResponseDecoder>,
}

impl HttpDownloadClient {
    pub fn new(decoder: Arc<ResponseDecoder>) -> Self {
        Self {
            http: reqwest::Client::new(),
            decoder,
        }
    }

    pub fn with_client(http: reqwest::Client, decoder: Arc<ResponseDecoder>) -> Self {
        Self { http, decoder }
    }
}

#[async_trait]
impl DownloadClient for HttpDownloadClient {
    async fn download(&self, request: &DownloadRequest) -> Result<ResponseBundle> {
        debug!(url = %request.url, mime = request.mime_type.as_str(), "posting processing request");

        let response = self
            .http
            .post(&request.url)
            .header(header::ACCEPT, request.mime_type.as_str())
            .json(&request.payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Download(format!("{status}: {body}")));
        }

        let bytes = response.bytes().await?;
        (self.decoder)(request, &bytes)
    }
}
