use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use mime::Mime;

/// An uploaded identity document as received at the HTTP boundary.
#[derive(Debug, Clone)]
pub struct ProofUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Stable reference to a stored proof, suitable for persisting on a booking
/// and redisplaying later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredProof {
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProofStoreError {
    #[error("only JPEG/PNG allowed")]
    UnsupportedMediaType(String),
    #[error("identity proof storage failed: {0}")]
    Storage(String),
}

/// Store contract consumed by the booking core: persist an image, hand back a
/// URL. File content is not inspected beyond the MIME allow-list; the
/// resulting URL is trusted on bookings only because it came from this
/// endpoint, never as an arbitrary client-supplied string.
pub trait IdentityProofStore: Send + Sync {
    fn store(&self, upload: ProofUpload) -> Result<StoredProof, ProofStoreError>;
}

/// Image types accepted at the upload boundary.
pub fn is_allowed_image(content_type: &str) -> bool {
    match content_type.parse::<Mime>() {
        Ok(mime) => {
            mime.type_() == mime::IMAGE
                && matches!(mime.subtype().as_str(), "jpeg" | "jpg" | "png")
        }
        Err(_) => false,
    }
}

static PROOF_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Local-disk proof store: unique millisecond-timestamped file names under one
/// directory, served by the external static-file collaborator under `/uploads`.
#[derive(Debug, Clone)]
pub struct DiskProofStore {
    root: PathBuf,
    public_prefix: String,
}

impl DiskProofStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            public_prefix: "/uploads".to_string(),
        }
    }

    fn unique_file_name(original: &str) -> String {
        let extension = Path::new(original)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .unwrap_or_default();
        let seq = PROOF_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        format!("{}-{seq}{extension}", Utc::now().timestamp_millis())
    }
}

impl IdentityProofStore for DiskProofStore {
    fn store(&self, upload: ProofUpload) -> Result<StoredProof, ProofStoreError> {
        if !is_allowed_image(&upload.content_type) {
            return Err(ProofStoreError::UnsupportedMediaType(upload.content_type));
        }

        fs::create_dir_all(&self.root)
            .map_err(|err| ProofStoreError::Storage(err.to_string()))?;

        let file_name = Self::unique_file_name(&upload.file_name);
        let path = self.root.join(&file_name);
        fs::write(&path, &upload.bytes)
            .map_err(|err| ProofStoreError::Storage(err.to_string()))?;

        Ok(StoredProof {
            url: format!("{}/{}", self.public_prefix, file_name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn allow_list_accepts_only_jpeg_and_png() {
        assert!(is_allowed_image("image/jpeg"));
        assert!(is_allowed_image("image/jpg"));
        assert!(is_allowed_image("image/png"));
        assert!(!is_allowed_image("image/gif"));
        assert!(!is_allowed_image("application/pdf"));
        assert!(!is_allowed_image("text/html"));
        assert!(!is_allowed_image("not a mime"));
    }

    #[test]
    fn disk_store_writes_file_and_returns_uploads_url() {
        let root = env::temp_dir().join(format!(
            "bookstay-proofs-{}",
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let store = DiskProofStore::new(&root);

        let stored = store
            .store(ProofUpload {
                file_name: "passport.PNG".to_string(),
                content_type: "image/png".to_string(),
                bytes: vec![0x89, 0x50, 0x4e, 0x47],
            })
            .expect("proof stored");

        assert!(stored.url.starts_with("/uploads/"));
        assert!(stored.url.ends_with(".png"));
        let file_name = stored.url.trim_start_matches("/uploads/");
        assert_eq!(
            fs::read(root.join(file_name)).expect("file readable"),
            vec![0x89, 0x50, 0x4e, 0x47]
        );

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn disk_store_rejects_disallowed_types_without_writing() {
        let root = env::temp_dir().join(format!(
            "bookstay-proofs-reject-{}",
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let store = DiskProofStore::new(&root);

        let err = store
            .store(ProofUpload {
                file_name: "resume.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                bytes: vec![1, 2, 3],
            })
            .expect_err("pdf rejected");

        assert!(matches!(err, ProofStoreError::UnsupportedMediaType(_)));
        assert!(!root.exists());
    }
}
