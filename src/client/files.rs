use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use std::path::Path;

use crate::models::response::FileUpload;
use crate::models::upload::{ALLOWED_TYPES, UploadLimits, extension, is_allowed};

/// A file the user picked, held in memory until submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PendingFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        PendingFile {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, inferring its content type from the extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = extension(&name)
            .and_then(|ext| ALLOWED_TYPES.iter().find(|(e, _)| *e == ext))
            .map(|(_, mimes)| mimes[0].to_string())
            .unwrap_or_default();
        Ok(PendingFile::new(name, content_type, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRejection {
    pub filename: String,
    pub rule: String,
}

impl fmt::Display for FileRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.filename, self.rule)
    }
}

impl std::error::Error for FileRejection {}

/// Check a newly selected file against the ones already queued.
pub fn validate_selection(
    existing: &[PendingFile],
    candidate: &PendingFile,
    limits: &UploadLimits,
) -> Result<(), FileRejection> {
    let reject = |rule: String| FileRejection {
        filename: candidate.name.clone(),
        rule,
    };

    if existing.len() >= limits.max_files {
        return Err(reject(format!("at most {} files can be attached", limits.max_files)));
    }
    if candidate.bytes.is_empty() {
        return Err(reject("file is empty".to_string()));
    }
    if candidate.size() > limits.max_file_bytes {
        return Err(reject(format!(
            "file is larger than {} bytes",
            limits.max_file_bytes
        )));
    }
    if !is_allowed(&candidate.name, &candidate.content_type) {
        return Err(reject("file type is not allowed".to_string()));
    }
    if existing.iter().any(|f| f.name == candidate.name) {
        return Err(reject("a file with this name is already attached".to_string()));
    }
    Ok(())
}

/// Base64-encode a queued file for the save request.
pub fn encode(file: &PendingFile) -> FileUpload {
    FileUpload {
        filename: file.name.clone(),
        content: STANDARD.encode(&file.bytes),
        content_type: file.content_type.clone(),
        size: Some(file.size()),
    }
}

/// Encode every queued file, one blocking task per file.
pub async fn encode_all(files: &[PendingFile]) -> Vec<FileUpload> {
    let tasks: Vec<_> = files
        .iter()
        .cloned()
        .map(|file| tokio::task::spawn_blocking(move || encode(&file)))
        .collect();

    let mut encoded = Vec::with_capacity(tasks.len());
    for (task, file) in tasks.into_iter().zip(files) {
        match task.await {
            Ok(upload) => encoded.push(upload),
            Err(e) => {
                log::warn!("Encoding task for {} failed ({}), encoding inline", file.name, e);
                encoded.push(encode(file));
            }
        }
    }
    encoded
}
