pub mod http;
pub mod local;

use async_trait::async_trait;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;
use url::Url;

pub use http::HttpBlobStore;
pub use local::LocalBlobStore;

/// Everything except RFC 3986 unreserved characters, so `/` inside an object
/// path is encoded as `%2F`.
const OBJECT_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KnowledgeLocationError {
    #[error("not a valid URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported URL scheme `{0}`")]
    UnsupportedScheme(String),

    #[error("URL path is not of the form /v0/b/{{bucket}}/o/{{object}}")]
    MissingObjectSegment,

    #[error("object lives in bucket `{found}`, expected `{expected}`")]
    ForeignBucket { expected: String, found: String },

    #[error("object path is not valid UTF-8 after decoding")]
    InvalidEncoding,

    #[error("object path is unsafe: {0}")]
    UnsafePath(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    InvalidLocation(#[from] KnowledgeLocationError),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("object {path} is {size} bytes, limit is {limit}")]
    TooLarge { path: String, size: usize, limit: usize },

    #[error("storage I/O error: {0}")]
    Io(String),

    #[error("storage HTTP error: {0}")]
    Http(String),
}

/// Bucket and object path of a knowledge document, recovered from its
/// download URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeLocation {
    bucket: String,
    path: String,
}

impl KnowledgeLocation {
    /// Parses a download URL of the form
    /// `https://host/v0/b/{bucket}/o/{percent-encoded path}?alt=media&token=...`.
    pub fn parse(raw: &str) -> Result<Self, KnowledgeLocationError> {
        let url = Url::parse(raw.trim())
            .map_err(|e| KnowledgeLocationError::InvalidUrl(e.to_string()))?;

        match url.scheme() {
            "http" | "https" => {}
            other => return Err(KnowledgeLocationError::UnsupportedScheme(other.to_string())),
        }

        let (bucket, encoded) = url
            .path()
            .strip_prefix("/v0/b/")
            .and_then(|rest| rest.split_once('/'))
            .and_then(|(bucket, rest)| Some((bucket, rest.strip_prefix("o/")?)))
            .filter(|(bucket, _)| !bucket.is_empty())
            .ok_or(KnowledgeLocationError::MissingObjectSegment)?;

        let decode = |value: &str| {
            percent_decode_str(value)
                .decode_utf8()
                .map(|decoded| decoded.into_owned())
                .map_err(|_| KnowledgeLocationError::InvalidEncoding)
        };
        let bucket = decode(bucket)?;
        let path = decode(encoded)?;

        validate_object_path(&path)?;

        Ok(KnowledgeLocation { bucket, path })
    }

    /// Like [`Self::parse`], but only accepts objects stored in `bucket`.
    pub fn parse_in_bucket(raw: &str, bucket: &str) -> Result<Self, KnowledgeLocationError> {
        let location = Self::parse(raw)?;
        if location.bucket != bucket {
            return Err(KnowledgeLocationError::ForeignBucket {
                expected: bucket.to_string(),
                found: location.bucket,
            });
        }
        Ok(location)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment, used for format detection.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Rejects object paths that could address something other than a single
/// object below the store root.
pub fn validate_object_path(path: &str) -> Result<(), KnowledgeLocationError> {
    let unsafe_path = |reason: &str| Err(KnowledgeLocationError::UnsafePath(reason.to_string()));

    if path.is_empty() {
        return unsafe_path("empty path");
    }
    if path.starts_with('/') {
        return unsafe_path("absolute path");
    }
    if path.contains('\\') {
        return unsafe_path("backslash in path");
    }
    if path.chars().any(char::is_control) {
        return unsafe_path("control character in path");
    }
    for segment in path.split('/') {
        match segment {
            "" => return unsafe_path("empty segment"),
            "." | ".." => return unsafe_path("relative segment"),
            _ => {}
        }
    }
    Ok(())
}

/// Download URL for `path` in the storage REST layout.
pub fn object_url(api_base: &str, bucket: &str, path: &str) -> String {
    format!(
        "{}/v0/b/{}/o/{}?alt=media",
        api_base.trim_end_matches('/'),
        bucket,
        utf8_percent_encode(path, OBJECT_PATH)
    )
}

/// Keeps the original file name readable while making it safe as a single
/// path segment.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let cleaned: String = base
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Binary object storage addressed by path.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Stores `bytes` at `path` and returns the object's download URL.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;

    fn download_url(&self, path: &str) -> String;
}
