use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Public URL prefix under which stored images are served.
pub const IMAGES_ROUTE: &str = "/images";

/// Stores uploaded recipe photos on disk.
pub struct ImageService {
    uploads_dir: PathBuf,
}

impl ImageService {
    #[must_use]
    pub fn new(uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
        }
    }

    #[must_use]
    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Writes the upload as `{unix_millis}-{name}` and returns its public path.
    pub async fn save_upload(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        let filename = format!(
            "{}-{}",
            chrono::Utc::now().timestamp_millis(),
            sanitize_filename(original_name)
        );

        if !self.uploads_dir.exists() {
            fs::create_dir_all(&self.uploads_dir).await?;
        }

        let file_path = self.uploads_dir.join(&filename);

        fs::write(&file_path, bytes)
            .await
            .with_context(|| format!("Failed to write image to {}", file_path.display()))?;

        info!(path = %file_path.display(), size = bytes.len(), "Stored recipe image");

        Ok(format!("{IMAGES_ROUTE}/{filename}"))
    }
}

/// Keeps only the final path component and a safe character set.
fn sanitize_filename(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

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
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
