//! Tag-based script encoding used on the wire.
//!
//! Unlike the compressed-script stream codec, every recognized shape gets a
//! dedicated leading tag byte and the decoder rebuilds the exact canonical
//! script bytes. Witness programs (P2WPKH, P2WSH, P2TR) are covered here in
//! addition to the legacy templates.

use crate::serialize::{read_vec_len, write_compact_size};
use crate::{Error, Result};
use bitcoin::ScriptBuf;
use std::io::{self, Read, Write};

const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;
const OP_EQUAL: u8 = 0x87;
const OP_0: u8 = 0x00;
const OP_1: u8 = 0x51;

/// The closed set of script shapes a tag byte can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ScriptTag {
    Unknown = 0x00,
    P2pkh = 0x01,
    P2pkEven = 0x02,
    P2pkOdd = 0x03,
    P2pkUncompressed = 0x04,
    P2sh = 0x05,
    P2wsh = 0x06,
    P2wpkh = 0x07,
    P2tr = 0x08,
}

impl ScriptTag {
    fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0x00 => Ok(Self::Unknown),
            0x01 => Ok(Self::P2pkh),
            0x02 => Ok(Self::P2pkEven),
            0x03 => Ok(Self::P2pkOdd),
            0x04 => Ok(Self::P2pkUncompressed),
            0x05 => Ok(Self::P2sh),
            0x06 => Ok(Self::P2wsh),
            0x07 => Ok(Self::P2wpkh),
            0x08 => Ok(Self::P2tr),
            other => Err(Error::UnknownScriptTag(other)),
        }
    }
}

/// Wrapper selecting the tagged, exactly-reconstructable serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconstructableScript(pub ScriptBuf);

/// Splits a script into its tag and the payload slice the tag implies.
fn classify(script: &[u8]) -> (ScriptTag, &[u8]) {
    if script.len() == 34 && script[0] == OP_1 && script[1] == 32 {
        return (ScriptTag::P2tr, &script[2..34]);
    }
    if script.len() == 34 && script[0] == OP_0 && script[1] == 32 {
        return (ScriptTag::P2wsh, &script[2..34]);
    }
    if script.len() == 22 && script[0] == OP_0 && script[1] == 20 {
        return (ScriptTag::P2wpkh, &script[2..22]);
    }
    if script.len() == 23 && script[0] == OP_HASH160 && script[1] == 20 && script[22] == OP_EQUAL {
        return (ScriptTag::P2sh, &script[2..22]);
    }
    if script.len() == 25
        && script[0] == OP_DUP
        && script[1] == OP_HASH160
        && script[2] == 20
        && script[23] == OP_EQUALVERIFY
        && script[24] == OP_CHECKSIG
    {
        return (ScriptTag::P2pkh, &script[3..23]);
    }
    if script.len() == 35 && script[0] == 33 && script[34] == OP_CHECKSIG {
        if script[1] == 0x02 {
            return (ScriptTag::P2pkEven, &script[2..34]);
        }
        if script[1] == 0x03 {
            return (ScriptTag::P2pkOdd, &script[2..34]);
        }
    }
    if script.len() == 67 && script[0] == 65 && script[66] == OP_CHECKSIG && script[1] == 0x04 {
        return (ScriptTag::P2pkUncompressed, &script[2..66]);
    }
    (ScriptTag::Unknown, script)
}

impl ReconstructableScript {
    pub fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let script = self.0.as_bytes();
        let (tag, payload) = classify(script);
        writer.write_all(&[tag as u8])?;
        if tag == ScriptTag::Unknown {
            write_compact_size(writer, script.len() as u64)?;
        }
        writer.write_all(payload)?;
        Ok(())
    }

    pub fn deserialize<R: Read>(reader: &mut R) -> Result<Self> {
        let mut tag_byte = [0u8; 1];
        reader.read_exact(&mut tag_byte)?;
        let tag = ScriptTag::from_byte(tag_byte[0])?;

        let bytes = match tag {
            ScriptTag::Unknown => {
                let len = read_vec_len(reader)? as usize;
                let mut bytes = vec![0u8; len];
                reader.read_exact(&mut bytes)?;
                bytes
            }
            ScriptTag::P2pkh => {
                let mut hash = [0u8; 20];
                reader.read_exact(&mut hash)?;
                let mut bytes = Vec::with_capacity(25);
                bytes.extend([OP_DUP, OP_HASH160, 20]);
                bytes.extend(hash);
                bytes.extend([OP_EQUALVERIFY, OP_CHECKSIG]);
                bytes
            }
            ScriptTag::P2pkEven | ScriptTag::P2pkOdd => {
                // The tag byte doubles as the pubkey parity prefix.
                let mut xcoord = [0u8; 32];
                reader.read_exact(&mut xcoord)?;
                let mut bytes = Vec::with_capacity(35);
                bytes.push(33);
                bytes.push(tag as u8);
                bytes.extend(xcoord);
                bytes.push(OP_CHECKSIG);
                bytes
            }
            ScriptTag::P2pkUncompressed => {
                let mut point = [0u8; 64];
                reader.read_exact(&mut point)?;
                let mut bytes = Vec::with_capacity(67);
                bytes.push(65);
                bytes.push(0x04);
                bytes.extend(point);
                bytes.push(OP_CHECKSIG);
                bytes
            }
            ScriptTag::P2sh => {
                let mut hash = [0u8; 20];
                reader.read_exact(&mut hash)?;
                let mut bytes = Vec::with_capacity(23);
                bytes.extend([OP_HASH160, 20]);
                bytes.extend(hash);
                bytes.push(OP_EQUAL);
                bytes
            }
            ScriptTag::P2wsh => {
                let mut hash = [0u8; 32];
                reader.read_exact(&mut hash)?;
                let mut bytes = Vec::with_capacity(34);
                bytes.extend([OP_0, 32]);
                bytes.extend(hash);
                bytes
            }
            ScriptTag::P2wpkh => {
                let mut hash = [0u8; 20];
                reader.read_exact(&mut hash)?;
                let mut bytes = Vec::with_capacity(22);
                bytes.extend([OP_0, 20]);
                bytes.extend(hash);
                bytes
            }
            ScriptTag::P2tr => {
                let mut x_only = [0u8; 32];
                reader.read_exact(&mut x_only)?;
                let mut bytes = Vec::with_capacity(34);
                bytes.extend([OP_1, 32]);
                bytes.extend(x_only);
                bytes
            }
        };
        Ok(Self(ScriptBuf::from_bytes(bytes)))
    }
}
