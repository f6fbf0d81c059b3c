//! Chunking strategy: single PUT or multipart, and how parts are cut

use crate::config::UploadConfig;

/// Most object stores refuse part numbers above this.
pub const MAX_PARTS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPlan {
    pub use_multipart: bool,
    pub file_size: u64,
    pub part_size: u64,
    pub part_count: u32,
}

/// Decide how a file of `file_size` bytes is uploaded.
///
/// Files at or below the threshold (and empty files) use one PUT. Larger
/// files are cut into `part_size` parts, growing the part size if the
/// count would pass [`MAX_PARTS`].
pub fn decide(file_size: u64, config: &UploadConfig) -> UploadPlan {
    if file_size == 0 || file_size <= config.multipart_threshold {
        return UploadPlan {
            use_multipart: false,
            file_size,
            part_size: file_size,
            part_count: 1,
        };
    }

    let part_size = std::cmp::max(config.part_size.max(1), file_size.div_ceil(MAX_PARTS));
    UploadPlan::multipart(file_size, part_size)
}

impl UploadPlan {
    /// Multipart plan with a fixed part size, as recorded in a checkpoint.
    pub fn multipart(file_size: u64, part_size: u64) -> Self {
        let part_size = part_size.max(1);
        Self {
            use_multipart: true,
            file_size,
            part_size,
            part_count: u32::try_from(file_size.div_ceil(part_size)).unwrap_or(u32::MAX),
        }
    }

    /// Byte range `[start, end)` of a 1-based part number.
    pub fn part_range(&self, part_number: u32) -> (u64, u64) {
        let start = (part_number as u64 - 1) * self.part_size;
        let end = std::cmp::min(start + self.part_size, self.file_size);
        (start, end)
    }

    pub fn part_len(&self, part_number: u32) -> u64 {
        let (start, end) = self.part_range(part_number);
        end - start
    }

    pub fn contains_part(&self, part_number: u32) -> bool {
        part_number >= 1 && part_number <= self.part_count
    }

    /// Bytes covered by the given part numbers.
    pub fn bytes_for<I>(&self, parts: I) -> u64
    where
        I: IntoIterator<Item = u32>,
    {
        parts
            .into_iter()
            .filter(|n| self.contains_part(*n))
            .map(|n| self.part_len(n))
            .sum()
    }
}
