//! Blob storage for original uploads.
//!
//! The pipeline only ever writes here. The stored document is attached to
//! its folder for later human review and export, never read back by the
//! pipeline itself.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid blob name: {0}")]
    InvalidName(String),
}

/// Durable storage for raw document bytes. Returns a retrievable location.
pub trait BlobStorage: Send + Sync {
    fn put(&self, name: &str, bytes: &[u8], media_type: &str) -> Result<String, StorageError>;
}

/// Filesystem-backed blob store rooted at a directory.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl BlobStorage for LocalBlobStore {
    fn put(&self, name: &str, bytes: &[u8], media_type: &str) -> Result<String, StorageError> {
        let safe = sanitize_name(name)?;
        std::fs::create_dir_all(&self.root)?;
        let path = self.root.join(&safe);
        std::fs::write(&path, bytes)?;
        tracing::debug!(
            blob = %safe,
            media_type = %media_type,
            size = bytes.len(),
            "Stored upload blob"
        );
        Ok(format!("file://{}", path.display()))
    }
}

/// Reduce an arbitrary file name to a single safe path component.
fn sanitize_name(name: &str) -> Result<String, StorageError> {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches(|c| c == '.' || c == '_').is_empty() {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_writes_file_and_returns_location() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().to_path_buf());

        let url = store
            .put("escritura_45.pdf", b"%PDF-1.4 fake", "application/pdf")
            .unwrap();

        assert!(url.starts_with("file://"));
        let stored = std::fs::read(dir.path().join("escritura_45.pdf")).unwrap();
        assert_eq!(stored, b"%PDF-1.4 fake");
    }

    #[test]
    fn put_sanitizes_path_separators() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().to_path_buf());

        store.put("../../etc/passwd", b"x", "text/plain").unwrap();

        // Nothing escaped the root.
        assert!(!dir.path().join("../../etc/passwd").exists());
        assert!(dir.path().join(".._.._etc_passwd").exists());
    }

    #[test]
    fn put_rejects_empty_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().to_path_buf());
        assert!(matches!(
            store.put("..", b"x", "text/plain"),
            Err(StorageError::InvalidName(_))
        ));
    }
}
