//! Image upload collaborator.
//!
//! Uploading is the one genuinely fallible operation the shopping pages
//! perform, and the only one that surfaces a failure to the user, through a
//! transient notice. The engine itself never uploads anything on its own.

use std::future::Future;
use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument};
use url::Url;

use crate::notifier::Notifier;

/// Errors from an image upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// No files were submitted.
    #[error("no files to upload")]
    NoFiles,

    /// A local file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The request could not be sent or the response body not read.
    #[error("upload request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("upload rejected with HTTP {0}")]
    Status(u16),

    /// The server returned a different number of URLs than files sent.
    #[error("expected {expected} URLs, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

/// A file to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Read a file from disk, guessing the content type from its extension.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Io` if the file cannot be read.
    pub async fn from_path(path: &Path) -> Result<Self, UploadError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| UploadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());
        Ok(Self {
            content_type: guess_content_type(&file_name).map(str::to_string),
            file_name,
            bytes,
        })
    }
}

fn guess_content_type(file_name: &str) -> Option<&'static str> {
    let extension = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Submits files and returns one reference URL per file.
pub trait ImageUploader {
    /// Upload `files`.
    fn upload(
        &self,
        files: Vec<UploadFile>,
    ) -> impl Future<Output = Result<Vec<String>, UploadError>> + Send;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    urls: Vec<String>,
}

/// Uploader posting `multipart/form-data` to an HTTP endpoint.
///
/// Every file is sent as a `files` part. The endpoint must answer with
/// `{"urls": [...]}` in submission order.
#[derive(Debug, Clone)]
pub struct HttpImageUploader {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpImageUploader {
    /// Create an uploader for `endpoint`.
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Create an uploader reusing an existing HTTP client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }
}

impl ImageUploader for HttpImageUploader {
    #[instrument(skip(self, files), fields(endpoint = %self.endpoint, count = files.len()))]
    async fn upload(&self, files: Vec<UploadFile>) -> Result<Vec<String>, UploadError> {
        if files.is_empty() {
            return Err(UploadError::NoFiles);
        }
        let expected = files.len();

        let mut form = Form::new();
        for file in files {
            let mut part = Part::bytes(file.bytes).file_name(file.file_name);
            if let Some(content_type) = file.content_type {
                part = part.mime_str(&content_type)?;
            }
            form = form.part("files", part);
        }

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Status(status.as_u16()));
        }

        let body: UploadResponse = response.json().await?;
        if body.urls.len() != expected {
            return Err(UploadError::CountMismatch {
                expected,
                actual: body.urls.len(),
            });
        }
        Ok(body.urls)
    }
}

/// Upload `files` and report the outcome as a notice.
///
/// # Errors
///
/// Returns the uploader's error after queuing an error notice.
pub async fn upload_with_feedback<U: ImageUploader>(
    uploader: &U,
    notifier: &Notifier,
    files: Vec<UploadFile>,
) -> Result<Vec<String>, UploadError> {
    match uploader.upload(files).await {
        Ok(urls) => {
            info!(count = urls.len(), "Images uploaded");
            let noun = if urls.len() == 1 { "image" } else { "images" };
            notifier.success(format!("Uploaded {} {noun}", urls.len()));
            Ok(urls)
        }
        Err(e) => {
            notifier.error(format!("Image upload failed: {e}"));
            Err(e)
        }
    }
}
