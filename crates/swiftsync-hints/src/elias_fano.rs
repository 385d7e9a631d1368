//! Elias-Fano coding of sorted index sequences.
//!
//! Each element is split at a width `l` chosen from the element count and
//! the maximum value: the low `l` bits are bit-packed verbatim, the high
//! bits become unary-coded gaps between consecutive elements. The result
//! stays within a couple of bits per element of the information-theoretic
//! minimum while remaining streamable.

use crate::{Error, Result};
use swiftsync_compressor::serialize::{read_compact_size, read_vec_len, write_compact_size};
use std::io::{self, Read, Write};

/// Bit sink filling bytes most-significant bit first.
struct BitWriter {
    bytes: Vec<u8>,
    current: u8,
    filled: u8,
}

impl BitWriter {
    fn new() -> Self {
        Self {
            bytes: Vec::new(),
            current: 0,
            filled: 0,
        }
    }

    fn push(&mut self, bit: bool) {
        self.current |= (bit as u8) << (7 - self.filled);
        self.filled += 1;
        if self.filled == 8 {
            self.bytes.push(self.current);
            self.current = 0;
            self.filled = 0;
        }
    }

    /// Flushes a trailing partial byte and returns the buffer.
    fn finish(mut self) -> Vec<u8> {
        if self.filled > 0 {
            self.bytes.push(self.current);
        }
        self.bytes
    }
}

/// Bit cursor reading bytes most-significant bit first.
struct BitReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    fn next(&mut self) -> Result<bool> {
        let byte = self
            .bytes
            .get(self.position / 8)
            .ok_or(Error::MalformedPayload("bit stream exhausted"))?;
        let bit = byte & (0x80 >> (self.position % 8)) != 0;
        self.position += 1;
        Ok(bit)
    }
}

fn low_bit_width(n: u64, max: u64) -> u32 {
    let ratio = (max + 1) / n;
    if ratio <= 1 { 0 } else { ratio.ilog2() }
}

/// A compressed, weakly increasing sequence of u32 indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EliasFano {
    n: u64,
    max: u64,
    low_bits: Vec<u8>,
    high_bits: Vec<u8>,
}

impl EliasFano {
    /// Compresses a weakly increasing sequence.
    pub fn compress(values: &[u32]) -> Self {
        debug_assert!(values.windows(2).all(|pair| pair[0] <= pair[1]));

        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as u64;
        let max = values[values.len() - 1] as u64;
        let l = low_bit_width(n, max);

        let mut low = BitWriter::new();
        let mut high = BitWriter::new();
        let mut prev_high = 0;
        for &value in values {
            let value = value as u64;
            for bit in 0..l {
                low.push(value >> bit & 1 == 1);
            }
            let high_part = value >> l;
            for _ in 0..high_part - prev_high {
                high.push(false);
            }
            high.push(true);
            prev_high = high_part;
        }

        Self {
            n,
            max,
            low_bits: low.finish(),
            high_bits: high.finish(),
        }
    }

    /// Rebuilds the original sequence.
    pub fn decompress(&self) -> Result<Vec<u32>> {
        if self.n == 0 {
            return Ok(Vec::new());
        }
        let l = low_bit_width(self.n, self.max);

        let mut low = BitReader::new(&self.low_bits);
        let mut high = BitReader::new(&self.high_bits);
        let mut values = Vec::with_capacity(self.n as usize);
        let mut prefix: u64 = 0;
        for _ in 0..self.n {
            let mut low_part: u64 = 0;
            for bit in 0..l {
                low_part |= (low.next()? as u64) << bit;
            }
            while !high.next()? {
                prefix += 1;
            }
            let value = (prefix << l) | low_part;
            values.push(
                u32::try_from(value)
                    .map_err(|_| Error::MalformedPayload("element exceeds u32"))?,
            );
        }
        Ok(values)
    }

    /// Number of encoded elements.
    pub fn len(&self) -> u64 {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Writes the sequence: element count, then for non-empty sequences
    /// the maximum value and the two bit buffers. Buffer sizes are implied
    /// by the count and maximum, so the buffers are written raw.
    pub fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_compact_size(writer, self.n)?;
        if self.n == 0 {
            return Ok(());
        }
        write_compact_size(writer, self.max)?;
        writer.write_all(&self.low_bits)?;
        writer.write_all(&self.high_bits)?;
        Ok(())
    }

    pub fn deserialize<R: Read>(reader: &mut R) -> Result<Self> {
        let n = read_vec_len(reader)?;
        if n == 0 {
            return Ok(Self::default());
        }
        let max = read_compact_size(reader)?;
        if max > u32::MAX as u64 {
            return Err(Error::MalformedPayload("maximum exceeds u32"));
        }
        let l = low_bit_width(n, max);

        let mut low_bits = vec![0u8; ((n * l as u64 + 7) / 8) as usize];
        reader.read_exact(&mut low_bits)?;
        let mut high_bits = vec![0u8; ((n + (max >> l) + 7) / 8) as usize];
        reader.read_exact(&mut high_bits)?;

        Ok(Self {
            n,
            max,
            low_bits,
            high_bits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(values: &[u32]) {
        let ef = EliasFano::compress(values);
        assert_eq!(ef.decompress().unwrap(), values);

        let mut encoded = Vec::new();
        ef.serialize(&mut encoded).unwrap();
        let decoded = EliasFano::deserialize(&mut encoded.as_slice()).unwrap();
        assert_eq!(decoded.decompress().unwrap(), values);
    }

    #[test]
    fn test_compress_decompress() {
        let indices: Vec<u32> = (0..111_115)
            .filter(|i| i % 7 != 0 && i % 13 != 0 && (i + 5) % 3 != 0)
            .collect();
        roundtrip(&indices);
    }

    #[test]
    fn test_sparse_sequences() {
        roundtrip(&[0]);
        roundtrip(&[u32::MAX]);
        roundtrip(&[0, u32::MAX]);
        roundtrip(&[7, 7, 7, 7]);
        roundtrip(&[0, 1, 2, 3, 4, 5, 6, 7]);
        roundtrip(&[1_000, 1_000_000, 1_000_000_000]);
    }

    #[test]
    fn test_random_sequences() {
        for _ in 0..50 {
            let len = fastrand::usize(1..500);
            let mut values: Vec<u32> = (0..len).map(|_| fastrand::u32(..)).collect();
            values.sort_unstable();
            roundtrip(&values);
        }
    }

    #[test]
    fn test_empty_sequence_is_one_byte() {
        let ef = EliasFano::compress(&[]);
        assert!(ef.is_empty());

        let mut encoded = Vec::new();
        ef.serialize(&mut encoded).unwrap();
        assert_eq!(encoded, vec![0x00]);

        let decoded = EliasFano::deserialize(&mut encoded.as_slice()).unwrap();
        assert!(decoded.decompress().unwrap().is_empty());
    }

    #[test]
    fn test_truncated_high_bits_rejected() {
        // All-zero high bits never terminate an element.
        let broken = EliasFano {
            n: 3,
            max: 100,
            low_bits: vec![0u8; 2],
            high_bits: vec![0u8; 1],
        };
        assert!(broken.decompress().is_err());
    }
}
