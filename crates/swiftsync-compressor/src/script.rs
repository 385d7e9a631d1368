//! Stream codec that compresses standard scripts and size-prefixes the rest.

use crate::compressor::{compress_script, decompress_script, special_script_size};
use crate::serialize::{read_varint, write_varint};
use crate::Result;
use bitcoin::ScriptBuf;
use bitcoin::opcodes;
use bitcoin::script::Builder;
use std::io::{self, Read, Write};

/// Largest script a decoder will materialize.
pub const MAX_SCRIPT_SIZE: usize = 10_000;

const NUM_SPECIAL_SCRIPTS: u64 = 6;

/// Wrapper selecting the compressed script serialization.
///
/// A recognized template is written as its bare special payload; anything
/// else is written as `VarInt(len + 6)` followed by the raw bytes, so the
/// first six size values stay reserved for the special cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCompression(pub ScriptBuf);

impl ScriptCompression {
    pub fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        if let Some(compressed_script) = compress_script(self.0.as_bytes()) {
            writer.write_all(&compressed_script.0)?;
            return Ok(());
        }
        write_varint(writer, self.0.len() as u64 + NUM_SPECIAL_SCRIPTS)?;
        writer.write_all(self.0.as_bytes())?;
        Ok(())
    }

    pub fn deserialize<R: Read>(reader: &mut R) -> Result<Self> {
        let n_size = read_varint(reader)?;
        if n_size < NUM_SPECIAL_SCRIPTS {
            let mut payload = vec![0u8; special_script_size(n_size as u8)];
            reader.read_exact(&mut payload)?;
            return decompress_script(n_size as u8, &payload).map(Self);
        }

        let size = n_size - NUM_SPECIAL_SCRIPTS;
        if size > MAX_SCRIPT_SIZE as u64 {
            // Overly long script, replace with a short invalid one and skip
            // the declared bytes.
            let skipped = io::copy(&mut reader.take(size), &mut io::sink())?;
            if skipped < size {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }
            let script = Builder::new()
                .push_opcode(opcodes::all::OP_RETURN)
                .into_script();
            return Ok(Self(script));
        }

        let mut bytes = vec![0u8; size as usize];
        reader.read_exact(&mut bytes)?;
        Ok(Self(ScriptBuf::from_bytes(bytes)))
    }
}
