//! Blob storage for uploaded files.
//!
//! Id cards and room photos are written to a single upload directory under a random prefix plus
//! a sanitised version of the client's filename. Callers write the blob first and only then
//! commit the database row that references it, so a row never points at a missing file.

use crate::errors::{Error, Result};
use rand::Rng;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Filename supplied by the client; untrusted
    pub filename: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Whether the client actually sent a file.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty() || self.filename.trim().is_empty()
    }
}

/// Directory-backed blob store.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Creates a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the blobs.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `upload` and returns the stored blob name.
    #[instrument(skip(self, upload), fields(filename = %upload.filename, size = upload.bytes.len()))]
    pub async fn save(&self, upload: &Upload) -> Result<String> {
        let name = format!("{}_{}", random_hex(16), sanitize_filename(&upload.filename));
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&name), &upload.bytes).await?;
        debug!(blob = %name, "Stored upload");
        Ok(name)
    }

    /// Reads a stored blob. Names that are not plain single path components are refused.
    pub async fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        if !is_plain_name(name) {
            return Err(Error::validation("Invalid file name"));
        }
        match tokio::fs::read(self.root.join(name)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes a blob whose database row could not be committed.
    pub async fn discard(&self, name: &str) {
        if !is_plain_name(name) {
            return;
        }
        if let Err(e) = tokio::fs::remove_file(self.root.join(name)).await {
            tracing::warn!(blob = %name, error = %e, "Failed to discard orphaned upload");
        }
    }
}

/// Keeps ASCII letters, digits, `.`, `-` and `_`; everything else becomes `_`.
/// Leading dots are dropped and an empty result becomes `"file"`.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name == sanitize_filename(name)
}

/// Random lowercase hex string built from `len` random bytes.
pub(crate) fn random_hex(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| format!("{:02x}", rng.gen_range(0..=u8::MAX)))
        .collect()
}
