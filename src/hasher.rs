//! Content digest used to decide whether a checkpoint still belongs to a file

use sha2::{Digest, Sha256};
use std::io;

use crate::source::UploadSource;

/// Read window for hashing (2 MB)
pub const HASH_WINDOW: u64 = 2 * 1024 * 1024;

/// Stream the source through SHA-256 in fixed windows and return the hex digest.
///
/// Windows are read one after another; any failed read aborts the whole
/// digest.
pub async fn hash_source(source: &dyn UploadSource) -> io::Result<String> {
    let size = source.size();
    let mut hasher = Sha256::new();
    let mut offset = 0u64;

    while offset < size {
        let len = std::cmp::min(HASH_WINDOW, size - offset);
        let window = source.read_range(offset, len).await?;
        hasher.update(&window);
        offset += len;
    }

    Ok(hex::encode(hasher.finalize()))
}
