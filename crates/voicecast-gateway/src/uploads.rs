//! Upload store: keeps uploaded CSV and video files under generated names.
//! Client file names only contribute a whitelisted extension, never a path.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Video containers accepted for preview. Stored as uploaded, never transcoded.
pub const ALLOWED_VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm", "flv"];

#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Opens `<uuid>.<extension>` for writing. Bytes go to disk as they are written.
    pub async fn create(&self, extension: &str) -> std::io::Result<PendingUpload> {
        tokio::fs::create_dir_all(&self.root).await?;
        let name = format!("{}.{}", Uuid::new_v4(), extension);
        let path = self.root.join(&name);
        let file = tokio::fs::File::create(&path).await?;
        Ok(PendingUpload {
            name,
            path,
            file,
            written: 0,
        })
    }

    /// Writes `bytes` as `<uuid>.<extension>` and returns the generated name.
    pub async fn store(&self, bytes: &[u8], extension: &str) -> std::io::Result<String> {
        let mut pending = self.create(extension).await?;
        if let Err(e) = pending.write(bytes).await {
            pending.discard().await;
            return Err(e);
        }
        pending.finish().await
    }
}

/// An upload being written. Either `finish` it or `discard` it.
#[derive(Debug)]
pub struct PendingUpload {
    name: String,
    path: PathBuf,
    file: tokio::fs::File,
    written: u64,
}

impl PendingUpload {
    pub async fn write(&mut self, chunk: &[u8]) -> std::io::Result<()> {
        self.file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Flushes the file and returns the generated name.
    pub async fn finish(mut self) -> std::io::Result<String> {
        if let Err(e) = self.file.flush().await {
            self.discard().await;
            return Err(e);
        }
        tracing::info!(name = %self.name, bytes = self.written, "upload stored");
        Ok(self.name)
    }

    /// Removes the partial file.
    pub async fn discard(self) {
        drop(self.file);
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            tracing::warn!(name = %self.name, error = %e, "partial upload not removed");
        }
    }
}

/// Lowercased extension of a client file name, if any.
pub fn extension_of(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Extension to store a video under, when the client file name is an accepted container.
pub fn video_extension(file_name: &str) -> Option<String> {
    extension_of(file_name).filter(|ext| ALLOWED_VIDEO_EXTENSIONS.contains(&ext.as_str()))
}

pub fn is_csv(file_name: &str) -> bool {
    extension_of(file_name).as_deref() == Some("csv")
}
