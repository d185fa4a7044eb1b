use bytes::Bytes;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Placeholder shown by the upload surface when no file is selected.
pub const NO_SELECTION_TEXT: &str = "Click or drag file here to upload";

/// Where the payload bytes live.
#[derive(Clone)]
pub enum PayloadSource {
    /// A file on disk, streamed at transfer time.
    Path(PathBuf),
    /// Bytes already in memory (drag-and-drop buffers, tests).
    Memory(Bytes),
}

impl fmt::Debug for PayloadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            PayloadSource::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
        }
    }
}

/// Binary payload chosen by the user for upload.
#[derive(Debug, Clone)]
pub struct FilePayload {
    display_name: String,
    content_type: Option<String>,
    size: u64,
    source: PayloadSource,
}

impl FilePayload {
    /// Payload backed by a file on disk. The size is read from the file metadata.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Not a regular file: {}", path.display()),
            ));
        }

        let display_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("video")
            .to_string();

        Ok(Self {
            content_type: content_type_for_name(&display_name).map(str::to_string),
            display_name,
            size: metadata.len(),
            source: PayloadSource::Path(path.to_path_buf()),
        })
    }

    /// Payload backed by an in-memory buffer.
    pub fn from_bytes(display_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let display_name = display_name.into();
        let data = data.into();
        Self {
            content_type: content_type_for_name(&display_name).map(str::to_string),
            display_name,
            size: data.len() as u64,
            source: PayloadSource::Memory(data),
        }
    }

    /// Override the MIME type reported for this payload.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        self.content_type = if content_type.trim().is_empty() {
            None
        } else {
            Some(content_type.trim().to_lowercase())
        };
        self
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The payload's MIME type, or `default` when it has none.
    pub fn resolved_content_type(&self, default: &str) -> String {
        self.content_type
            .clone()
            .unwrap_or_else(|| default.to_string())
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn source(&self) -> &PayloadSource {
        &self.source
    }
}

/// Map a file name's extension to a video MIME type.
pub fn content_type_for_name(name: &str) -> Option<&'static str> {
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())?;

    match extension.as_str() {
        "mp4" => Some("video/mp4"),
        "webm" => Some("video/webm"),
        "mov" => Some("video/quicktime"),
        "avi" => Some("video/x-msvideo"),
        "mkv" => Some("video/x-matroska"),
        "m4v" => Some("video/x-m4v"),
        _ => {
            tracing::debug!(extension = %extension, "Unknown extension, no content type inferred");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_is_inferred_from_extension() {
        assert_eq!(content_type_for_name("clip.MP4"), Some("video/mp4"));
        assert_eq!(content_type_for_name("clip.mov"), Some("video/quicktime"));
        assert_eq!(content_type_for_name("clip.bin"), None);
        assert_eq!(content_type_for_name("noextension"), None);
    }

    #[test]
    fn resolved_content_type_falls_back_to_default() {
        let payload = FilePayload::from_bytes("raw.bin", vec![0u8; 4]);
        assert_eq!(payload.content_type(), None);
        assert_eq!(payload.resolved_content_type("video/mp4"), "video/mp4");

        let payload = payload.with_content_type("Video/WebM");
        assert_eq!(payload.resolved_content_type("video/mp4"), "video/webm");

        let payload = FilePayload::from_bytes("holiday.mkv", vec![1u8; 8]);
        assert_eq!(payload.resolved_content_type("video/mp4"), "video/x-matroska");
        assert_eq!(payload.size(), 8);
        assert_eq!(payload.display_name(), "holiday.mkv");
    }

    #[test]
    fn from_path_reads_size_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movie.webm");
        std::fs::write(&path, b"0123456789").unwrap();

        let payload = FilePayload::from_path(&path).unwrap();
        assert_eq!(payload.display_name(), "movie.webm");
        assert_eq!(payload.size(), 10);
        assert_eq!(payload.content_type(), Some("video/webm"));
        assert!(matches!(payload.source(), PayloadSource::Path(_)));

        assert!(FilePayload::from_path(dir.path()).is_err());
        assert!(FilePayload::from_path(dir.path().join("missing.mp4")).is_err());
    }
}
