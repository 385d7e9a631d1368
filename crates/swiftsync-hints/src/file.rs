//! Random-access hints file.
//!
//! Layout: four magic bytes, a version byte selecting the payload
//! encoding, a u32 entry count, then a preallocated directory of
//! `(height, file position)` pairs followed by the per-block payloads.
//! Payloads are appended at the end of the file while the matching
//! directory slot is patched in place, so a partially written file is
//! readable up to its last committed block.

use crate::elias_fano::EliasFano;
use crate::{Error, Result};
use swiftsync_compressor::serialize::{read_compact_size, read_vec_len, write_compact_size};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub const FILE_MAGIC: [u8; 4] = [0x55, 0x54, 0x58, 0x4f];
// file magic length + version + entry count
pub const FILE_HEADER_LEN: u64 = 9;

const DIRECTORY_ENTRY_LEN: u64 = 12;

/// How the per-block unspent-index lists are stored, selected by the file
/// version byte. Files written before the Elias-Fano transition carry
/// plain delta lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadEncoding {
    /// Version 0x00: a compact-size count followed by compact-size deltas;
    /// absolute indices are the prefix sums.
    DeltaList,
    /// Version 0x01: the Elias-Fano serialization.
    EliasFano,
}

impl PayloadEncoding {
    fn version(self) -> u8 {
        match self {
            Self::DeltaList => 0x00,
            Self::EliasFano => 0x01,
        }
    }

    fn from_version(version: u8) -> Option<Self> {
        match version {
            0x00 => Some(Self::DeltaList),
            0x01 => Some(Self::EliasFano),
            _ => None,
        }
    }
}

/// Creates a hints file and appends one payload per block.
pub struct HintsFileWriter {
    file: File,
    path: PathBuf,
    encoding: PayloadEncoding,
    preallocate: u32,
    index: u32,
}

impl HintsFileWriter {
    /// Creates a new hints file able to hold `preallocate` blocks.
    pub fn create(
        path: impl AsRef<Path>,
        preallocate: u32,
        encoding: PayloadEncoding,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        file.write_all(&FILE_MAGIC)?;
        file.write_all(&[encoding.version()])?;
        file.write_all(&preallocate.to_le_bytes())?;
        // Zero-initialized directory; slots are patched as blocks arrive.
        file.write_all(&vec![0u8; (preallocate as u64 * DIRECTORY_ENTRY_LEN) as usize])?;
        file.flush()?;

        tracing::debug!(?path, preallocate, "created hints file");

        Ok(Self {
            file,
            path,
            encoding,
            preallocate,
            index: 0,
        })
    }

    /// Appends the unspent output indices of the next block.
    ///
    /// `unspent_indices` are positions in the block's flattened output
    /// list, sorted ascending. The payload is committed before returning,
    /// so a reader opening the file afterwards sees this block.
    pub fn write_next_unspents(&mut self, height: u32, unspent_indices: &[u32]) -> Result<()> {
        debug_assert!(unspent_indices.windows(2).all(|pair| pair[0] <= pair[1]));

        if self.index >= self.preallocate {
            return Err(Error::DirectoryFull(self.preallocate));
        }

        let position = self.file.seek(SeekFrom::End(0))?;

        let mut payload = Vec::new();
        match self.encoding {
            PayloadEncoding::DeltaList => {
                write_compact_size(&mut payload, unspent_indices.len() as u64)?;
                let mut prev = 0;
                for &index in unspent_indices {
                    write_compact_size(&mut payload, (index - prev) as u64)?;
                    prev = index;
                }
            }
            PayloadEncoding::EliasFano => {
                EliasFano::compress(unspent_indices).serialize(&mut payload)?;
            }
        }

        self.file.seek(SeekFrom::Start(
            FILE_HEADER_LEN + self.index as u64 * DIRECTORY_ENTRY_LEN,
        ))?;
        self.file.write_all(&height.to_le_bytes())?;
        self.file.write_all(&position.to_le_bytes())?;

        self.file.seek(SeekFrom::Start(position))?;
        self.file.write_all(&payload)?;
        self.file.sync_data()?;

        self.index += 1;
        Ok(())
    }

    /// Returns the path of the output file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of blocks written so far.
    pub fn blocks_written(&self) -> u32 {
        self.index
    }

    /// Size of the file in megabytes.
    pub fn size_mb(&self) -> Result<f64> {
        Ok(self.file.metadata()?.len() as f64 / 1_000_000.0)
    }

    /// Flushes and closes the file.
    pub fn close(self) -> Result<()> {
        self.file.sync_all()?;
        tracing::info!(
            path = ?self.path,
            blocks = self.index,
            size_mb = self.file.metadata()?.len() as f64 / 1_000_000.0,
            "hints file complete"
        );
        Ok(())
    }
}

/// Reads per-block payloads from a hints file.
pub struct HintsFileReader {
    file: BufReader<File>,
    encoding: PayloadEncoding,
    stop_height: u32,
    positions: HashMap<u32, u64>,
}

impl HintsFileReader {
    /// Opens a hints file, validating the header and loading the
    /// directory. Directory slots never written (position zero) are
    /// skipped, so a file abandoned mid-write serves its committed blocks.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = BufReader::new(File::open(path.as_ref())?);

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if magic != FILE_MAGIC {
            return Err(Error::MalformedHeader {
                expected: FILE_MAGIC,
                got: magic,
            });
        }

        let mut version = [0u8; 1];
        file.read_exact(&mut version)?;
        let encoding = PayloadEncoding::from_version(version[0])
            .ok_or(Error::UnsupportedVersion(version[0]))?;

        let mut stop_height = [0u8; 4];
        file.read_exact(&mut stop_height)?;
        let stop_height = u32::from_le_bytes(stop_height);

        let mut positions = HashMap::with_capacity(stop_height as usize);
        for _ in 0..stop_height {
            let mut entry = [0u8; DIRECTORY_ENTRY_LEN as usize];
            file.read_exact(&mut entry)?;
            let height = u32::from_le_bytes(entry[..4].try_into().expect("4-byte field; qed"));
            let position = u64::from_le_bytes(entry[4..].try_into().expect("8-byte field; qed"));
            if position != 0 {
                positions.insert(height, position);
            }
        }

        tracing::info!(
            path = ?path.as_ref(),
            stop_height,
            blocks = positions.len(),
            "opened hints file"
        );

        Ok(Self {
            file,
            encoding,
            stop_height,
            positions,
        })
    }

    /// The number of directory entries the file was created with; the
    /// terminal height of the accelerated sync.
    pub fn stop_height(&self) -> u32 {
        self.stop_height
    }

    /// Returns the absolute unspent output indices recorded for `height`.
    pub fn read_block(&mut self, height: u32) -> Result<Vec<u32>> {
        let position = *self
            .positions
            .get(&height)
            .ok_or(Error::HeightNotPresent(height))?;
        self.file.seek(SeekFrom::Start(position))?;

        match self.encoding {
            PayloadEncoding::DeltaList => {
                let count = read_vec_len(&mut self.file)?;
                let mut indices = Vec::with_capacity(count as usize);
                let mut accumulated: u64 = 0;
                for _ in 0..count {
                    accumulated = accumulated
                        .checked_add(read_compact_size(&mut self.file)?)
                        .ok_or(Error::MalformedPayload("index overflows"))?;
                    let index = u32::try_from(accumulated)
                        .map_err(|_| Error::MalformedPayload("index exceeds u32"))?;
                    indices.push(index);
                }
                Ok(indices)
            }
            PayloadEncoding::EliasFano => {
                EliasFano::deserialize(&mut self.file)?.decompress()
            }
        }
    }
}
