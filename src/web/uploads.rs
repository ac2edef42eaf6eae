use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::{
    config::UploadConfig,
    domain::StoredFile,
    error::{AppError, Result},
};

/// Save an uploaded attachment to the uploads directory as
/// `<random hex>_<sanitized name>`.
pub async fn save_uploaded_file(
    config: &UploadConfig,
    filename: &str,
    data: &[u8],
) -> Result<StoredFile> {
    // Validate file size
    if data.len() > config.max_bytes {
        return Err(AppError::Upload(too_large_message(config)));
    }

    let original_name = sanitize_filename(filename);
    if original_name.is_empty() {
        return Err(AppError::Upload("Invalid filename".to_string()));
    }

    let extension = extension_of(&original_name).unwrap_or_default();
    if !config.is_allowed_extension(&extension) {
        return Err(AppError::Upload(format!(
            "Invalid file type. Allowed: {}",
            config.allowed_extensions.join(", ")
        )));
    }

    // Ensure uploads directory exists
    let uploads_path = PathBuf::from(&config.dir);
    fs::create_dir_all(&uploads_path).await.map_err(|e| {
        AppError::Internal(format!("Failed to create uploads directory: {}", e))
    })?;

    let stored_name = format!("{}_{}", Uuid::new_v4().simple(), original_name);
    let file_path = uploads_path.join(&stored_name);

    // create_new: never clobber an existing attachment
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&file_path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create file: {}", e)))?;

    file.write_all(data).await.map_err(|e| {
        AppError::Internal(format!("Failed to write file: {}", e))
    })?;
    file.flush().await.map_err(|e| {
        AppError::Internal(format!("Failed to write file: {}", e))
    })?;

    tracing::info!(stored_name = %stored_name, bytes = data.len(), "Stored attachment");

    Ok(StoredFile {
        path: stored_name,
        original_name,
    })
}

pub fn too_large_message(config: &UploadConfig) -> String {
    format!("File too large (max {} MB)", config.max_bytes / (1024 * 1024))
}

/// Removes an attachment whose announcement was never created.
pub async fn discard_uploaded_file(config: &UploadConfig, stored: &StoredFile) {
    let path = PathBuf::from(&config.dir).join(&stored.path);
    if let Err(e) = fs::remove_file(&path).await {
        tracing::warn!(stored_name = %stored.path, "Failed to remove orphaned attachment: {}", e);
    }
}

/// Reduces a client-supplied filename to a safe single path component.
///
/// Keeps ASCII letters, digits, `.`, `-` and `_`; whitespace becomes `_`; any
/// directory part is dropped. Leading dots and underscores at either end are
/// stripped.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or("");

    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() => Some(c),
            '.' | '-' | '_' => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();

    cleaned.trim_start_matches('.').trim_matches('_').to_string()
}

fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}
