use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use roster_core::{ImageError, ImageRef, ImageService, PhotoUpload, ResizeOptions};
use uuid::Uuid;

/// [`ImageService`] that keeps blobs as files below a root directory.
///
/// References are paths relative to the root, e.g. `users/<uuid>-150x150.png`.
/// The requested size is recorded in the file name; pixels are stored as uploaded.
#[derive(Debug, Clone)]
pub struct DiskImageStore {
    root: PathBuf,
}

impl DiskImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute location of a stored reference.
    pub fn resolve(&self, image: &ImageRef) -> Result<PathBuf, ImageError> {
        let relative = Path::new(image.as_str());
        let is_plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if image.as_str().is_empty() || !is_plain {
            return Err(ImageError::Delete(format!(
                "invalid image reference: {image}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

fn validate_prefix(prefix: &str) -> Result<(), ImageError> {
    let valid = !prefix.is_empty()
        && Path::new(prefix)
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if valid {
        Ok(())
    } else {
        Err(ImageError::Store(format!("invalid image prefix: {prefix}")))
    }
}

fn detect_extension(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        "png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "jpg"
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        "gif"
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "webp"
    } else {
        "img"
    }
}

fn file_name(bytes: &[u8], resize: Option<ResizeOptions>) -> String {
    let id = Uuid::now_v7();
    let ext = detect_extension(bytes);
    match resize {
        Some(size) => format!("{id}-{size}.{ext}"),
        None => format!("{id}.{ext}"),
    }
}

#[async_trait]
impl ImageService for DiskImageStore {
    async fn store(
        &self,
        photo: &PhotoUpload,
        prefix: &str,
        resize: Option<ResizeOptions>,
    ) -> Result<ImageRef, ImageError> {
        if photo.is_empty() {
            return Err(ImageError::Store("empty image payload".to_string()));
        }
        validate_prefix(prefix)?;

        let dir = self.root.join(prefix);
        tokio::fs::create_dir_all(&dir).await.map_err(|err| {
            ImageError::Store(format!("image dir create failed ({}): {err}", dir.display()))
        })?;

        let name = file_name(&photo.bytes, resize);
        let tmp_path = dir.join(format!(".{name}.tmp"));
        let final_path = dir.join(&name);
        if let Err(err) = tokio::fs::write(&tmp_path, &photo.bytes).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(ImageError::Store(format!(
                "image write failed ({}): {err}",
                tmp_path.display()
            )));
        }
        if let Err(err) = tokio::fs::rename(&tmp_path, &final_path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(ImageError::Store(format!(
                "image rename failed ({}): {err}",
                final_path.display()
            )));
        }

        let image = ImageRef::new(format!("{prefix}/{name}"));
        tracing::debug!(
            event = "image_stored",
            image = %image,
            bytes = photo.bytes.len(),
            "Image stored"
        );
        Ok(image)
    }

    async fn delete(&self, image: &ImageRef) -> Result<(), ImageError> {
        let path = self.resolve(image)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(event = "image_deleted", image = %image, "Image deleted");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ImageError::Delete(format!(
                "image delete failed ({}): {err}",
                path.display()
            ))),
        }
    }
}
