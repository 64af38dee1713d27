use std::fmt::Display;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use percent_encoding::utf8_percent_encode;
use reqwest::{header::CONTENT_TYPE, Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};

use super::{object_url, validate_object_path, BlobStore, StorageError, OBJECT_PATH};

/// Client for a storage service exposing the `/v0/b/{bucket}/o/{path}` REST
/// layout.
#[derive(Clone)]
pub struct HttpBlobStore {
    client: Client,
    api_base: String,
    bucket: String,
    access_token: Option<SecretString>,
    max_bytes: usize,
}

impl HttpBlobStore {
    pub fn new(
        api_base: &str,
        bucket: &str,
        access_token: Option<SecretString>,
        max_bytes: usize,
    ) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            access_token,
            max_bytes,
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        validate_object_path(path)?;
        let url = self.download_url(path);
        log::debug!("Downloading object {} from {}", path, self.bucket);

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| StorageError::Http(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(StorageError::NotFound(path.to_string())),
            status if !status.is_success() => {
                return Err(StorageError::Http(format!("GET {path} returned {status}")))
            }
            _ => {}
        }

        if let Some(length) = response.content_length() {
            if length as usize > self.max_bytes {
                return Err(StorageError::TooLarge {
                    path: path.to_string(),
                    size: length as usize,
                    limit: self.max_bytes,
                });
            }
        }

        collect_limited(path, response.bytes_stream(), self.max_bytes).await
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        validate_object_path(path)?;
        let url = format!(
            "{}/v0/b/{}/o?name={}",
            self.api_base,
            self.bucket,
            utf8_percent_encode(path, OBJECT_PATH)
        );

        let response = self
            .authorize(self.client.post(&url))
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Http(format!("upload of {path} returned {status}")));
        }

        log::info!("Uploaded object {} to {}", path, self.bucket);
        Ok(self.download_url(path))
    }

    fn download_url(&self, path: &str) -> String {
        object_url(&self.api_base, &self.bucket, path)
    }
}

/// Drains a body stream, giving up as soon as it grows past `limit` bytes.
/// A missing or wrong `Content-Length` cannot push the buffer over the limit.
async fn collect_limited<S, B, E>(path: &str, chunks: S, limit: usize) -> Result<Vec<u8>, StorageError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut chunks = std::pin::pin!(chunks);
    let mut body = Vec::new();

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(|e| StorageError::Http(e.to_string()))?;
        let chunk = chunk.as_ref();
        if body.len() + chunk.len() > limit {
            return Err(StorageError::TooLarge {
                path: path.to_string(),
                size: body.len() + chunk.len(),
                limit,
            });
        }
        body.extend_from_slice(chunk);
    }

    Ok(body)
}
