//! On-disk image of a range-tree store.
//!
//! The file is a fixed 16 byte header followed by one bincode payload with
//! every map of the store:
//!
//! ```text
//! +-------+---------+----------+-------------+-----------------+
//! | magic | version | checksum | payload len | payload         |
//! | u32   | u32     | u32      | u32         | bincode(image)  |
//! +-------+---------+----------+-------------+-----------------+
//! ```
//!
//! All integers are little endian. The checksum is a CRC-32 of the payload.
//! Files are replaced atomically: the new image goes to a sibling temp file
//! which is synced and then renamed over the old one.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use rstar::RTree;
use serde::{Deserialize, Serialize};

use super::error::{StoreError, StoreResult};
use crate::spatial_key::SpatialKey;
use crate::util::crc32;

/// Magic number for file format identification
pub const MAGIC: u32 = 0x53525452; // "SRTR"

/// File format version
pub const VERSION: u32 = 1;

const HEADER_LEN: usize = 16;

/// One named map and its tree.
#[derive(Serialize, Deserialize)]
pub(crate) struct MapImage {
    pub(crate) name: String,
    pub(crate) tree: RTree<SpatialKey>,
}

/// Every map of a store.
#[derive(Serialize, Deserialize, Default)]
pub(crate) struct StoreImage {
    pub(crate) maps: Vec<MapImage>,
}

/// Reads and writes a [`StoreImage`] at a fixed path.
#[derive(Debug, Clone)]
pub(crate) struct StoreFile {
    path: PathBuf,
}

impl StoreFile {
    pub(crate) fn new(path: &Path) -> Self {
        StoreFile {
            path: path.to_path_buf(),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the image, or an empty one if the file does not exist yet.
    pub(crate) fn read(&self) -> StoreResult<StoreImage> {
        if !self.exists() {
            return Ok(StoreImage::default());
        }

        let bytes = fs::read(&self.path)?;
        if bytes.len() < HEADER_LEN {
            return Err(StoreError::Corrupted(format!(
                "{:?} is {} bytes, shorter than the header",
                self.path,
                bytes.len()
            )));
        }

        let magic = read_u32(&bytes, 0);
        let version = read_u32(&bytes, 4);
        let checksum = read_u32(&bytes, 8);
        let payload_len = read_u32(&bytes, 12) as usize;

        if magic != MAGIC {
            return Err(StoreError::Corrupted(format!(
                "bad magic {:#x} in {:?}",
                magic, self.path
            )));
        }
        if version != VERSION {
            return Err(StoreError::Corrupted(format!(
                "unsupported format version {} in {:?}",
                version, self.path
            )));
        }

        let payload = &bytes[HEADER_LEN..];
        if payload.len() != payload_len {
            return Err(StoreError::Corrupted(format!(
                "payload is {} bytes, header says {}",
                payload.len(),
                payload_len
            )));
        }
        if crc32(payload) != checksum {
            log::warn!("Checksum mismatch in spatial store {:?}", self.path);
            return Err(StoreError::Corrupted(format!(
                "checksum mismatch in {:?}",
                self.path
            )));
        }

        bincode::serde::decode_from_slice(payload, bincode::config::legacy())
            .map(|(image, _)| image)
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Atomically replaces the file with `image`.
    pub(crate) fn write(&self, image: &StoreImage) -> StoreResult<()> {
        let payload = bincode::serde::encode_to_vec(image, bincode::config::legacy())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let payload_len = u32::try_from(payload.len()).map_err(|_| {
            StoreError::Serialization(format!("store image too large: {} bytes", payload.len()))
        })?;

        let mut buffer = Vec::with_capacity(HEADER_LEN + payload.len());
        buffer.extend_from_slice(&MAGIC.to_le_bytes());
        buffer.extend_from_slice(&VERSION.to_le_bytes());
        buffer.extend_from_slice(&crc32(&payload).to_le_bytes());
        buffer.extend_from_slice(&payload_len.to_le_bytes());
        buffer.extend_from_slice(&payload);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.temp_path();
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)?;
            file.write_all(&buffer)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;
        sync_parent(&self.path);
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}

// Best effort: not every platform can open a directory for syncing.
fn sync_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
}
