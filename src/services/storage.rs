//! Filesystem storage for certificate artifacts and proof uploads.
//!
//! Layout:
//! - `<certificate_dir>/<certificate_id>/certificate.pdf`
//! - `<certificate_dir>/<certificate_id>/qr.png`
//! - `<upload_dir>/<activity_id>_<file name>`

use std::path::{Path, PathBuf};

use crate::error::AppError;

const CERTIFICATE_FILE: &str = "certificate.pdf";
const QR_FILE: &str = "qr.png";

/// Where a certificate's files were written.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredArtifact {
    pub artifact_path: PathBuf,
    pub qr_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    certificate_dir: PathBuf,
    upload_dir: PathBuf,
}

/// Restrict a name to `[A-Za-z0-9._-]`, replacing everything else with `_`.
///
/// Leading dots are stripped so the result never names a parent or hidden path.
pub fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

fn storage_error(action: &str, path: &Path, e: std::io::Error) -> AppError {
    AppError::Storage(format!("{} {}: {}", action, path.display(), e))
}

impl ArtifactStore {
    pub fn new(certificate_dir: impl Into<PathBuf>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            certificate_dir: certificate_dir.into(),
            upload_dir: upload_dir.into(),
        }
    }

    /// Create the root directories if they do not exist.
    pub async fn ensure_dirs(&self) -> Result<(), AppError> {
        for dir in [&self.certificate_dir, &self.upload_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| storage_error("create", dir, e))?;
        }
        Ok(())
    }

    pub fn certificate_folder(&self, certificate_id: &str) -> PathBuf {
        self.certificate_dir.join(sanitize_component(certificate_id))
    }

    /// Write the rendered PDF and QR image for one certificate.
    pub async fn write_certificate(
        &self,
        certificate_id: &str,
        pdf: &[u8],
        qr_png: &[u8],
    ) -> Result<StoredArtifact, AppError> {
        let folder = self.certificate_folder(certificate_id);
        tokio::fs::create_dir_all(&folder)
            .await
            .map_err(|e| storage_error("create", &folder, e))?;

        let artifact_path = folder.join(CERTIFICATE_FILE);
        let qr_path = folder.join(QR_FILE);

        tokio::fs::write(&artifact_path, pdf)
            .await
            .map_err(|e| storage_error("write", &artifact_path, e))?;
        tokio::fs::write(&qr_path, qr_png)
            .await
            .map_err(|e| storage_error("write", &qr_path, e))?;

        Ok(StoredArtifact {
            artifact_path,
            qr_path,
        })
    }

    /// Read an artifact back. `Ok(None)` if nothing exists at `path`.
    pub async fn read(&self, path: &Path) -> Result<Option<Vec<u8>>, AppError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error("read", path, e)),
        }
    }

    /// Store an uploaded proof document; returns its location.
    pub async fn write_proof(
        &self,
        activity_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, AppError> {
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| storage_error("create", &self.upload_dir, e))?;

        let path = self.upload_dir.join(format!(
            "{}_{}",
            sanitize_component(activity_id),
            sanitize_component(file_name)
        ));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| storage_error("write", &path, e))?;
        Ok(path)
    }
}
