//! Profile-picture storage on the local filesystem.

use anyhow::{Context, Result};
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::domain::error::DomainError;

/// Maximum accepted size of an uploaded picture.
pub const MAX_IMAGE_BYTES: usize = 1_000_000;

/// The multipart field carrying the picture.
pub const PROFILE_PICTURE_FIELD: &str = "profilePicture";

const ALLOWED_TYPES: &[&str] = &["jpeg", "jpg", "png"];

/// A file part pulled out of a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub field_name: String,
    pub original_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadedImage {
    /// Lowercased extension of the original filename, including the dot.
    fn extension(&self) -> String {
        Path::new(&self.original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .unwrap_or_default()
    }
}

/// Both the extension and the MIME subtype must be jpeg, jpg or png.
pub fn validate_image(image: &UploadedImage) -> Result<(), DomainError> {
    if image.data.len() > MAX_IMAGE_BYTES {
        return Err(DomainError::Validation("File too large".to_string()));
    }

    let extension = image.extension();
    let extension_ok = ALLOWED_TYPES.contains(&extension.trim_start_matches('.'));

    let mime = image.content_type.to_lowercase();
    let mime_ok = match mime.split_once('/') {
        Some(("image", subtype)) => {
            let subtype = subtype.split(';').next().unwrap_or_default().trim();
            ALLOWED_TYPES.contains(&subtype)
        }
        _ => false,
    };

    if extension_ok && mime_ok {
        Ok(())
    } else {
        Err(DomainError::Validation(
            "Images only (jpeg, jpg, png)".to_string(),
        ))
    }
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Cannot create upload directory {}", self.dir.display()))
    }

    /// Writes the image under `<field>-<unix millis><ext>` and returns the stored path.
    ///
    /// A name already taken by a concurrent upload moves on to the next millisecond.
    #[instrument(skip(self, image), fields(original_name = %image.original_name, size = image.data.len()))]
    pub async fn save(&self, image: &UploadedImage) -> Result<String> {
        self.ensure_dir().await?;
        let extension = image.extension();
        let mut millis = Utc::now().timestamp_millis();

        loop {
            let filename = format!("{}-{}{}", image.field_name, millis, extension);
            let path = self.dir.join(&filename);
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;

            match opened {
                Ok(mut file) => {
                    file.write_all(&image.data)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    file.flush().await?;
                    info!(path = %path.display(), "Stored uploaded image");
                    return Ok(path.to_string_lossy().into_owned());
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => millis += 1,
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to create {}", path.display()));
                }
            }
        }
    }

    /// Removes a stored image. A file that is already gone is not an error.
    #[instrument(skip(self))]
    pub async fn remove(&self, stored_path: &str) -> Result<()> {
        match tokio::fs::remove_file(stored_path).await {
            Ok(()) => {
                debug!("Removed stored image");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Stored image already absent, skipping removal");
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", stored_path)),
        }
    }

    /// Maps a public filename onto the upload directory. Anything but a single plain
    /// path component is refused.
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if !filename.contains('\\') => {
                Some(self.dir.join(name))
            }
            _ => None,
        }
    }
}
