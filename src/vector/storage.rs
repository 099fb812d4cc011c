//! Memory-mapped vector file for the persisted index.
//!
//! The vector store is written whole on every add and read back through a
//! memory map on startup, so loading never deserializes row by row.
//!
//! # Storage Format
//!
//! - Header (16 bytes): magic, version, dimension, vector count
//! - Vectors: contiguous f32 rows in little-endian format, in insertion order
//!
//! Row *i* of the file is position *i* of the index; there are no ids.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapOptions};
use tempfile::NamedTempFile;

use crate::vector::types::{VectorDimension, VectorError};

/// Current storage format version.
const STORAGE_VERSION: u32 = 1;

/// Size of the storage header in bytes.
const HEADER_SIZE: usize = 16;

/// Magic bytes to identify vector storage files.
const MAGIC_BYTES: &[u8; 4] = b"FRVC";

/// Number of bytes per f32 value.
const BYTES_PER_F32: usize = 4;

/// Vector rows loaded from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredVectors {
    pub dimension: VectorDimension,
    /// Row-major data, `count * dimension` values.
    pub data: Vec<f32>,
}

impl StoredVectors {
    #[must_use]
    pub fn count(&self) -> usize {
        self.data.len() / self.dimension.get()
    }
}

/// A single vector file on disk.
#[derive(Debug, Clone)]
pub struct VectorFile {
    path: PathBuf,
}

impl VectorFile {
    /// File name used inside an index directory.
    pub const FILE_NAME: &'static str = "vectors.bin";

    /// Vector file inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(Self::FILE_NAME),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checks if the storage file exists on disk.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Replaces the file with `data`.
    ///
    /// Rows are written to a sibling temp file which is then renamed over
    /// the target, so readers see either the old or the new file.
    pub fn write(&self, dimension: VectorDimension, data: &[f32]) -> Result<(), VectorError> {
        self.stage(dimension, data)?.commit()
    }

    /// Writes `data` next to the target without replacing it yet.
    pub fn stage(
        &self,
        dimension: VectorDimension,
        data: &[f32],
    ) -> Result<StagedFile, VectorError> {
        if data.len() % dimension.get() != 0 {
            return Err(VectorError::InvalidFormat(format!(
                "{} values is not a whole number of {dimension}-dimensional rows",
                data.len()
            )));
        }

        StagedFile::create(&self.path, |writer| {
            let count = (data.len() / dimension.get()) as u32;

            writer.write_all(MAGIC_BYTES)?;
            writer.write_all(&STORAGE_VERSION.to_le_bytes())?;
            writer.write_all(&(dimension.get() as u32).to_le_bytes())?;
            writer.write_all(&count.to_le_bytes())?;

            for &value in data {
                writer.write_all(&value.to_le_bytes())?;
            }
            Ok(())
        })
    }

    /// Reads every row from the file.
    pub fn read(&self) -> Result<StoredVectors, VectorError> {
        let file = File::open(&self.path)?;
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        let (version, dimension, count) = Self::read_header(&mmap)?;
        if version != STORAGE_VERSION {
            return Err(VectorError::VersionMismatch {
                expected: STORAGE_VERSION,
                actual: version,
            });
        }

        let expected_len = HEADER_SIZE + count * dimension.get() * BYTES_PER_F32;
        if mmap.len() != expected_len {
            return Err(VectorError::InvalidFormat(format!(
                "header declares {count} vectors ({expected_len} bytes) but file has {} bytes",
                mmap.len()
            )));
        }

        let data = mmap[HEADER_SIZE..]
            .chunks_exact(BYTES_PER_F32)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        Ok(StoredVectors { dimension, data })
    }

    fn read_header(mmap: &Mmap) -> Result<(u32, VectorDimension, usize), VectorError> {
        if mmap.len() < HEADER_SIZE {
            return Err(VectorError::InvalidFormat(
                "File too small to contain header".to_string(),
            ));
        }

        if &mmap[0..4] != MAGIC_BYTES {
            return Err(VectorError::InvalidFormat("Invalid magic bytes".to_string()));
        }

        let version = u32::from_le_bytes([mmap[4], mmap[5], mmap[6], mmap[7]]);
        let dim_value = u32::from_le_bytes([mmap[8], mmap[9], mmap[10], mmap[11]]);
        let dimension = VectorDimension::new(dim_value as usize)?;
        let vector_count = u32::from_le_bytes([mmap[12], mmap[13], mmap[14], mmap[15]]) as usize;

        Ok((version, dimension, vector_count))
    }
}

/// A fully written temp file waiting to be renamed over its target.
///
/// Dropping it without calling [`StagedFile::commit`] removes the temp file
/// and leaves the target untouched.
#[derive(Debug)]
pub struct StagedFile {
    tmp: NamedTempFile,
    target: PathBuf,
}

impl StagedFile {
    /// Writes a sibling temp file of `target` through `fill`.
    pub fn create(
        target: &Path,
        fill: impl FnOnce(&mut BufWriter<&mut File>) -> std::io::Result<()>,
    ) -> Result<Self, VectorError> {
        let dir = target.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            fill(&mut writer)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;

        Ok(Self {
            tmp,
            target: target.to_path_buf(),
        })
    }

    /// Renames the temp file over the target.
    pub fn commit(self) -> Result<(), VectorError> {
        self.tmp
            .persist(&self.target)
            .map(|_| ())
            .map_err(|e| VectorError::Storage(e.error))
    }

    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }
}
