//! File attachments
//!
//! Files are validated (type allow-list, size ceiling) before they are read,
//! then read concurrently. A batch is only handed back once every read in it
//! has finished, so a caller never sees a partially loaded batch.

use crate::error::{Result, ValidationError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Default per-file ceiling (10 MB)
pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

const DOC_MIME: &str = "application/msword";
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const PDF_MIME: &str = "application/pdf";

/// A file attached to a user message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    /// Unique identifier
    pub id: String,
    /// File name as selected (no directory)
    pub name: String,
    /// MIME type
    pub mime_type: String,
    /// Size in bytes
    pub size: u64,
    /// Base64-encoded file content
    pub content: String,
    /// When the file was attached
    pub uploaded_at: DateTime<Utc>,
}

impl FileAttachment {
    /// Build an attachment from raw bytes
    ///
    /// # Examples
    ///
    /// ```
    /// use cemtras::attachments::FileAttachment;
    ///
    /// let file = FileAttachment::from_bytes("notes.txt", "text/plain", b"hi");
    /// assert_eq!(file.size, 2);
    /// assert_eq!(file.content, "aGk=");
    /// ```
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            id: format!("file_{}", Uuid::new_v4()),
            name: name.into(),
            mime_type: mime_type.into(),
            size: bytes.len() as u64,
            content: BASE64.encode(bytes),
            uploaded_at: Utc::now(),
        }
    }

    /// Whether the model accepts this file as inline data (images and PDFs)
    pub fn is_inline_supported(&self) -> bool {
        self.mime_type.starts_with("image/") || self.mime_type == PDF_MIME
    }

    /// Decode the stored content back into bytes
    pub fn decode(&self) -> Result<Vec<u8>> {
        Ok(BASE64.decode(&self.content)?)
    }
}

/// Infer a MIME type from the file name's extension
pub fn infer_mime_type(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Whether a MIME type is on the attachment allow-list
///
/// Images, PDF, plain text and Word documents are accepted.
pub fn is_allowed_mime(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
        || mime_type.starts_with("text/")
        || mime_type == PDF_MIME
        || mime_type == DOC_MIME
        || mime_type == DOCX_MIME
}

/// Check type and size constraints for a candidate file
pub fn validate_file(
    name: &str,
    mime_type: &str,
    size: u64,
    max_bytes: u64,
) -> std::result::Result<(), ValidationError> {
    if !is_allowed_mime(mime_type) {
        return Err(ValidationError::UnsupportedFileType {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
        });
    }
    if size > max_bytes {
        return Err(ValidationError::FileTooLarge {
            name: name.to_string(),
            size,
            max: max_bytes,
        });
    }
    Ok(())
}

/// A file that was not attached, with the reason
#[derive(Debug, Clone)]
pub struct RejectedFile {
    /// Path as given by the user
    pub path: PathBuf,
    /// Human-readable reason
    pub reason: String,
}

/// Result of loading a batch of files
#[derive(Debug, Default)]
pub struct AttachmentBatch {
    /// Files that passed validation and were read, in input order
    pub accepted: Vec<FileAttachment>,
    /// Files that were filtered out or failed to read, in input order
    pub rejected: Vec<RejectedFile>,
}

async fn load_one(path: &Path, max_bytes: u64) -> std::result::Result<FileAttachment, String> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = infer_mime_type(&name);

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| format!("Cannot read '{}': {}", path.display(), e))?;
    if !metadata.is_file() {
        return Err(format!("'{}' is not a regular file", path.display()));
    }

    validate_file(&name, &mime_type, metadata.len(), max_bytes).map_err(|e| e.to_string())?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("Cannot read '{}': {}", path.display(), e))?;

    // The file may have grown between stat and read.
    validate_file(&name, &mime_type, bytes.len() as u64, max_bytes).map_err(|e| e.to_string())?;

    Ok(FileAttachment::from_bytes(name, mime_type, &bytes))
}

/// Validate and read every file in `paths`
///
/// All reads are started together and joined; the batch is returned only
/// after each one has completed. Rejections never abort the other reads.
pub async fn load_attachments(paths: &[PathBuf], max_bytes: u64) -> AttachmentBatch {
    let reads = paths.iter().map(|path| load_one(path, max_bytes));
    let results = join_all(reads).await;

    let mut batch = AttachmentBatch::default();
    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok(file) => {
                tracing::debug!(name = %file.name, mime = %file.mime_type, size = file.size, "Attachment loaded");
                batch.accepted.push(file);
            }
            Err(reason) => {
                tracing::warn!("Attachment rejected: {}", reason);
                batch.rejected.push(RejectedFile {
                    path: path.clone(),
                    reason,
                });
            }
        }
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_file, temp_dir};

    #[test]
    fn test_infer_mime_type_common_extensions() {
        assert_eq!(infer_mime_type("kiln.png"), "image/png");
        assert_eq!(infer_mime_type("report.pdf"), PDF_MIME);
        assert_eq!(infer_mime_type("notes.txt"), "text/plain");
        assert_eq!(infer_mime_type("datasheet.docx"), DOCX_MIME);
        assert_eq!(infer_mime_type("blob"), "application/octet-stream");
    }

    #[test]
    fn test_allow_list() {
        assert!(is_allowed_mime("image/jpeg"));
        assert!(is_allowed_mime(PDF_MIME));
        assert!(is_allowed_mime("text/plain"));
        assert!(is_allowed_mime(DOC_MIME));
        assert!(!is_allowed_mime("application/zip"));
        assert!(!is_allowed_mime("video/mp4"));
    }

    #[test]
    fn test_validate_file_size_boundary() {
        assert!(validate_file("a.pdf", PDF_MIME, 10, 10).is_ok());
        let err = validate_file("a.pdf", PDF_MIME, 11, 10).unwrap_err();
        assert!(matches!(err, ValidationError::FileTooLarge { size: 11, .. }));
    }

    #[test]
    fn test_inline_support_only_images_and_pdf() {
        assert!(FileAttachment::from_bytes("a.png", "image/png", b"x").is_inline_supported());
        assert!(FileAttachment::from_bytes("a.pdf", PDF_MIME, b"x").is_inline_supported());
        assert!(!FileAttachment::from_bytes("a.txt", "text/plain", b"x").is_inline_supported());
    }

    #[test]
    fn test_decode_returns_original_bytes() {
        let file = FileAttachment::from_bytes("a.bin.txt", "text/plain", &[0, 159, 255]);
        assert_eq!(file.decode().unwrap(), vec![0, 159, 255]);
    }

    #[tokio::test]
    async fn test_load_attachments_partitions_in_order() {
        let dir = temp_dir();
        let ok = create_test_file(&dir, "notes.txt", "clinker");
        let bad_type = create_test_file(&dir, "archive.zip", "PK");
        let too_big = create_test_file(&dir, "big.txt", "0123456789ABCDEF");
        let missing = dir.path().join("missing.png");

        let batch = load_attachments(&[ok, bad_type, too_big, missing.clone()], 8).await;

        assert_eq!(batch.accepted.len(), 1);
        assert_eq!(batch.accepted[0].name, "notes.txt");
        assert_eq!(batch.accepted[0].decode().unwrap(), b"clinker");

        assert_eq!(batch.rejected.len(), 3);
        assert!(batch.rejected[0].reason.contains("unsupported type"));
        assert!(batch.rejected[1].reason.contains("too large"));
        assert_eq!(batch.rejected[2].path, missing);
    }

    #[tokio::test]
    async fn test_load_attachments_rejects_directories() {
        let dir = temp_dir();
        let sub = dir.path().join("folder.txt");
        std::fs::create_dir(&sub).unwrap();
        let batch = load_attachments(&[sub], DEFAULT_MAX_ATTACHMENT_BYTES).await;
        assert!(batch.accepted.is_empty());
        assert!(batch.rejected[0].reason.contains("not a regular file"));
    }
}
