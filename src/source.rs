//! File handles an upload reads from

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};

/// Random-access, read-only view of the bytes being uploaded.
///
/// The handle itself is never persisted; a checkpoint only records what
/// was derived from it (size and digest).
#[async_trait]
pub trait UploadSource: Send + Sync {
    /// Total size in bytes.
    fn size(&self) -> u64;

    /// Display name, stored as `filename` metadata on the object.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Read exactly `len` bytes starting at `offset`.
    async fn read_range(&self, offset: u64, len: u64) -> io::Result<Vec<u8>>;
}

/// A file on local disk. Each read opens its own handle so concurrent
/// parts never share a cursor.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: Option<String>,
    size: u64,
}

impl FileSource {
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Not a file: {}", path.display()),
            ));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_string());

        Ok(Self {
            path,
            name,
            size: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl UploadSource for FileSource {
    fn size(&self) -> u64 {
        self.size
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    async fn read_range(&self, offset: u64, len: u64) -> io::Result<Vec<u8>> {
        let mut file = File::open(&self.path).await?;
        file.seek(SeekFrom::Start(offset)).await?;

        let mut buffer = vec![0u8; len as usize];
        file.read_exact(&mut buffer).await?;
        Ok(buffer)
    }
}

/// An in-memory payload.
#[derive(Debug, Clone)]
pub struct BytesSource {
    data: Arc<[u8]>,
    name: Option<String>,
}

impl BytesSource {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Arc::from(data.into()),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[async_trait]
impl UploadSource for BytesSource {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    async fn read_range(&self, offset: u64, len: u64) -> io::Result<Vec<u8>> {
        let start = offset as usize;
        let end = start.checked_add(len as usize).unwrap_or(usize::MAX);
        if end > self.data.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "range {}..{} is past the end of a {} byte payload",
                    start,
                    end,
                    self.data.len()
                ),
            ));
        }
        Ok(self.data[start..end].to_vec())
    }
}
