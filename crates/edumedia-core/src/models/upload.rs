use bytes::Bytes;
use std::path::PathBuf;

/// Where the file content of an upload comes from
#[derive(Debug, Clone)]
pub enum UploadSource {
    /// Content already held in memory
    Bytes(Bytes),
    /// Content read from an already-written file (e.g. a spooled multipart part)
    Path(PathBuf),
}

impl UploadSource {
    /// Length of in-memory content; `None` for path sources.
    pub fn in_memory_len(&self) -> Option<usize> {
        match self {
            UploadSource::Bytes(b) => Some(b.len()),
            UploadSource::Path(_) => None,
        }
    }
}

impl From<Vec<u8>> for UploadSource {
    fn from(data: Vec<u8>) -> Self {
        UploadSource::Bytes(Bytes::from(data))
    }
}

impl From<Bytes> for UploadSource {
    fn from(data: Bytes) -> Self {
        UploadSource::Bytes(data)
    }
}

impl From<PathBuf> for UploadSource {
    fn from(path: PathBuf) -> Self {
        UploadSource::Path(path)
    }
}

/// A file handed to the upload orchestrator
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub source: UploadSource,
    pub original_filename: String,
    pub content_type: String,
    pub declared_size: u64,
    pub folder: Option<String>,
    pub target_height: Option<u32>,
    pub quality: Option<String>,
}

impl UploadRequest {
    pub fn new(
        source: impl Into<UploadSource>,
        original_filename: impl Into<String>,
        content_type: impl Into<String>,
        declared_size: u64,
    ) -> Self {
        Self {
            source: source.into(),
            original_filename: original_filename.into(),
            content_type: content_type.into(),
            declared_size,
            folder: None,
            target_height: None,
            quality: None,
        }
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn with_target_height(mut self, height: u32) -> Self {
        self.target_height = Some(height);
        self
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self
    }
}
