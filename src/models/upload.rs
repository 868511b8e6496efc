use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;
use std::collections::HashSet;

use crate::errors::AppError;
use crate::models::response::FileUpload;

pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_MAX_FILES: usize = 10;

/// Accepted attachments: extension and the MIME types browsers report for it.
pub const ALLOWED_TYPES: &[(&str, &[&str])] = &[
    ("pdf", &["application/pdf"]),
    ("doc", &["application/msword"]),
    ("docx", &["application/vnd.openxmlformats-officedocument.wordprocessingml.document"]),
    ("xls", &["application/vnd.ms-excel"]),
    ("xlsx", &["application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"]),
    ("ppt", &["application/vnd.ms-powerpoint"]),
    ("pptx", &["application/vnd.openxmlformats-officedocument.presentationml.presentation"]),
    ("png", &["image/png"]),
    ("jpg", &["image/jpeg"]),
    ("jpeg", &["image/jpeg"]),
    ("gif", &["image/gif"]),
    ("webp", &["image/webp"]),
    ("txt", &["text/plain"]),
    ("csv", &["text/csv", "application/vnd.ms-excel", "text/plain"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_file_bytes: u64,
    pub max_files: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        UploadLimits {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_files: DEFAULT_MAX_FILES,
        }
    }
}

pub fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn base_mime(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Whether a file of this name and declared type may be uploaded. A blank or
/// generic content type defers to the extension.
pub fn is_allowed(filename: &str, content_type: &str) -> bool {
    let mime = base_mime(content_type);
    let generic = mime.is_empty() || mime == "application/octet-stream";

    match extension(filename) {
        Some(ext) => ALLOWED_TYPES
            .iter()
            .find(|(e, _)| *e == ext)
            .is_some_and(|(_, mimes)| generic || mimes.contains(&mime.as_str())),
        None => !generic && ALLOWED_TYPES.iter().any(|(_, mimes)| mimes.contains(&mime.as_str())),
    }
}

/// Reduce a client filename to `[A-Za-z0-9._-]` without leading dots.
/// Returns `None` when nothing usable remains.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

fn generated_filename() -> String {
    let bytes: [u8; 8] = rand::rng().random();
    format!("upload_{}", hex::encode(bytes))
}

/// Strip an optional `data:<mime>;base64,` prefix as produced by browser readers.
fn strip_data_url(content: &str) -> &str {
    if content.starts_with("data:") {
        if let Some((_, payload)) = content.split_once(',') {
            return payload;
        }
    }
    content
}

/// A validated attachment ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFile {
    pub filename: String,
    pub original_filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Decode and validate every attachment of a save request. Either all files
/// pass or the first violation is returned, naming the file and the rule.
pub fn prepare_uploads(files: &[FileUpload], limits: &UploadLimits) -> Result<Vec<DecodedFile>, AppError> {
    if files.len() > limits.max_files {
        let name = files.get(limits.max_files).map(|f| f.filename.as_str()).unwrap_or("");
        return Err(AppError::file(
            name,
            format!("too many files (at most {} per request)", limits.max_files),
        ));
    }

    let mut seen = HashSet::new();
    let mut decoded = Vec::with_capacity(files.len());
    for file in files {
        let original = file.filename.trim().to_string();
        let filename = sanitize_filename(&original).unwrap_or_else(generated_filename);
        let label = if original.is_empty() { filename.as_str() } else { original.as_str() };

        let content = strip_data_url(file.content.trim());
        if content.is_empty() {
            return Err(AppError::file(label, "file is empty"));
        }
        // Reject before decoding when the encoded length alone is over the limit.
        if (content.len() as u64) / 4 * 3 > limits.max_file_bytes + 3 {
            return Err(AppError::file(
                label,
                format!("file exceeds the {} byte limit", limits.max_file_bytes),
            ));
        }
        let bytes = STANDARD
            .decode(content)
            .map_err(|e| AppError::file(label, format!("content is not valid base64 ({e})")))?;

        if bytes.is_empty() {
            return Err(AppError::file(label, "file is empty"));
        }
        if bytes.len() as u64 > limits.max_file_bytes {
            return Err(AppError::file(
                label,
                format!("file exceeds the {} byte limit", limits.max_file_bytes),
            ));
        }
        if let Some(declared) = file.size {
            if declared != bytes.len() as u64 {
                return Err(AppError::file(
                    label,
                    format!("declared size {declared} does not match content size {}", bytes.len()),
                ));
            }
        }
        if !is_allowed(&filename, &file.content_type) {
            return Err(AppError::file(
                label,
                format!("file type '{}' is not allowed", file.content_type),
            ));
        }
        if !seen.insert(filename.clone()) {
            return Err(AppError::file(label, "duplicate filename in request"));
        }

        let content_type = match base_mime(&file.content_type) {
            m if m.is_empty() => "application/octet-stream".to_string(),
            m => m,
        };
        decoded.push(DecodedFile {
            filename,
            original_filename: original,
            content_type,
            bytes,
        });
    }
    Ok(decoded)
}
