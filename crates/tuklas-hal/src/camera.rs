//! Generic `Camera` trait and a file-backed camera.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use tuklas_types::TuklasError;

/// One still image, encoded as the device produced it (JPEG, PNG, …).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    /// MIME type of `data`, e.g. `"image/jpeg"`.
    pub mime_type: String,
    /// Encoded image bytes.
    pub data: Vec<u8>,
}

/// A device that can take a still photograph.
pub trait Camera: Send {
    /// Stable identifier for this camera, e.g. `"back"`.
    fn id(&self) -> &str;

    /// Capture one still image.
    ///
    /// # Errors
    ///
    /// Returns [`TuklasError::Capture`] if no image can be produced
    /// (device busy, permission denied, nothing to read).
    fn capture(&mut self) -> Result<CapturedImage, TuklasError>;
}

/// A camera whose "shutter" reads an image file from disk.
///
/// Point it at a file with [`FileCamera::aim`] before each capture.
pub struct FileCamera {
    id: String,
    target: Option<PathBuf>,
}

impl FileCamera {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            target: None,
        }
    }

    /// Choose the file the next [`capture`][Camera::capture] will read.
    pub fn aim(&mut self, path: impl Into<PathBuf>) {
        self.target = Some(path.into());
    }

    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    fn fault(&self, details: impl Into<String>) -> TuklasError {
        TuklasError::Capture {
            device: self.id.clone(),
            details: details.into(),
        }
    }
}

impl Camera for FileCamera {
    fn id(&self) -> &str {
        &self.id
    }

    fn capture(&mut self) -> Result<CapturedImage, TuklasError> {
        let path = self
            .target
            .clone()
            .ok_or_else(|| self.fault("no image selected"))?;
        let mime_type = mime_type_for(&path)
            .ok_or_else(|| self.fault(format!("unsupported image type: {}", path.display())))?;
        let data = fs::read(&path)
            .map_err(|e| self.fault(format!("failed to read {}: {e}", path.display())))?;
        if data.is_empty() {
            return Err(self.fault(format!("{} is empty", path.display())));
        }
        debug!(camera = %self.id, bytes = data.len(), mime = mime_type, "image captured");
        Ok(CapturedImage {
            mime_type: mime_type.to_string(),
            data,
        })
    }
}

/// MIME type inferred from the file extension.
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_without_target_is_a_capture_fault() {
        let mut cam = FileCamera::new("back");
        let err = cam.capture().unwrap_err();
        assert!(
            matches!(&err, TuklasError::Capture { device, .. } if device == "back"),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn capture_reads_aimed_file() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("mouse.JPG");
        fs::write(&path, [0xFFu8, 0xD8, 0xFF, 0xE0]).unwrap();

        let mut cam = FileCamera::new("back");
        cam.aim(&path);
        let image = cam.capture().unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.data, vec![0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(cam.target(), Some(path.as_path()));
    }

    #[test]
    fn capture_rejects_missing_and_empty_files() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let mut cam = FileCamera::new("back");

        cam.aim(dir.path().join("nowhere.png"));
        assert!(cam.capture().is_err());

        let empty = dir.path().join("empty.png");
        fs::write(&empty, b"").unwrap();
        cam.aim(&empty);
        assert!(cam.capture().is_err());
    }

    #[test]
    fn capture_rejects_unknown_extension() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"hello").unwrap();
        let mut cam = FileCamera::new("back");
        cam.aim(&path);
        assert!(cam.capture().is_err());
    }

    #[test]
    fn mime_types_by_extension() {
        assert_eq!(mime_type_for(Path::new("a.png")), Some("image/png"));
        assert_eq!(mime_type_for(Path::new("a.jpeg")), Some("image/jpeg"));
        assert_eq!(mime_type_for(Path::new("a")), None);
    }
}
