//! Amount compression and the standard-script template matchers.

use crate::{Error, Result};
use bitcoin::ScriptBuf;
use bitcoin::opcodes;

/// The maximum legal monetary amount, in the smallest unit.
pub const MAX_MONEY: u64 = 21_000_000 * 100_000_000;

const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;
const OP_EQUAL: u8 = 0x87;

/// Losslessly shrinks a nonnegative amount.
///
/// Trailing base-10 zeros are folded into an exponent so that round values,
/// which dominate in practice, take very few bits.
///
/// NOTE: This function is defined only for 0 <= n <= [`MAX_MONEY`].
pub fn compress_amount(n: u64) -> u64 {
    assert!(n <= MAX_MONEY);

    if n == 0 {
        return 0;
    }
    let mut e = 0;
    let mut n = n;
    while n % 10 == 0 && e < 9 {
        n /= 10;
        e += 1;
    }
    if e < 9 {
        let d = n % 10;
        assert!((1..=9).contains(&d));
        n /= 10;
        1 + (n * 9 + d - 1) * 10 + e as u64
    } else {
        1 + (n - 1) * 10 + 9
    }
}

/// Exact inverse of [`compress_amount`].
pub fn decompress_amount(x: u64) -> u64 {
    if x == 0 {
        return 0;
    }
    let mut x = x - 1;
    let e = x % 10;
    x /= 10;
    let mut n = if e < 9 {
        let d = (x % 9) + 1;
        x /= 9;
        x * 10 + d
    } else {
        x + 1
    };
    for _ in 0..e {
        n *= 10;
    }
    n
}

fn to_key_id(script: &[u8]) -> Option<[u8; 20]> {
    if script.len() == 25
        && script[0] == OP_DUP
        && script[1] == OP_HASH160
        && script[2] == 20
        && script[23] == OP_EQUALVERIFY
        && script[24] == OP_CHECKSIG
    {
        Some(script[3..23].try_into().expect("Size must be 20; qed"))
    } else {
        None
    }
}

fn to_script_id(script: &[u8]) -> Option<[u8; 20]> {
    if script.len() == 23 && script[0] == OP_HASH160 && script[1] == 20 && script[22] == OP_EQUAL {
        Some(script[2..22].try_into().expect("Size must be 20; qed"))
    } else {
        None
    }
}

enum PublicKey {
    Compressed([u8; 33]),
    Uncompressed([u8; 65]),
}

fn to_pub_key(script: &[u8]) -> Option<PublicKey> {
    if script.len() == 35
        && script[0] == 33
        && script[34] == OP_CHECKSIG
        && (script[1] == 0x02 || script[1] == 0x03)
    {
        Some(PublicKey::Compressed(
            script[1..34].try_into().expect("Size must be 33; qed"),
        ))
    } else if script.len() == 67
        && script[0] == 65
        && script[66] == OP_CHECKSIG
        && script[1] == 0x04
    {
        // If not fully valid, it would not be compressible.
        let is_fully_valid = bitcoin::Script::from_bytes(script)
            .p2pk_public_key()
            .is_some();
        if is_fully_valid {
            Some(PublicKey::Uncompressed(
                script[1..66].try_into().expect("Size must be 65; qed"),
            ))
        } else {
            None
        }
    } else {
        None
    }
}

/// A script reduced to one of the special 21/33-byte payloads.
///
/// The leading byte selects the template; the payload length is implied by
/// it, so no size prefix is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedScript(pub Vec<u8>);

pub fn compress_script(script: &[u8]) -> Option<CompressedScript> {
    if let Some(hash) = to_key_id(script) {
        let mut out = Vec::with_capacity(21);
        out.push(0x00);
        out.extend(hash);
        return Some(CompressedScript(out));
    }

    if let Some(hash) = to_script_id(script) {
        let mut out = Vec::with_capacity(21);
        out.push(0x01);
        out.extend(hash);
        return Some(CompressedScript(out));
    }

    if let Some(public_key) = to_pub_key(script) {
        let mut out = Vec::with_capacity(33);

        match public_key {
            PublicKey::Compressed(compressed) => {
                out.extend(compressed);
            }
            PublicKey::Uncompressed(uncompressed) => {
                out.push(0x04 | (uncompressed[64] & 0x01));
                out.extend_from_slice(&uncompressed[1..33]);
            }
        }

        return Some(CompressedScript(out));
    }

    None
}

/// Payload length of a special script case, in bytes.
pub fn special_script_size(case: u8) -> usize {
    debug_assert!(case < 6);
    match case {
        0x00 | 0x01 => 20,
        _ => 32,
    }
}

/// Rebuilds the canonical script bytes for one of the six special cases.
///
/// `payload` must be exactly [`special_script_size`] bytes. Cases 4 and 5
/// recover the full uncompressed pubkey from the stored x-coordinate and
/// the parity carried by the case; an x that is not on the curve fails with
/// [`Error::InvalidPubkey`].
pub fn decompress_script(case: u8, payload: &[u8]) -> Result<ScriptBuf> {
    debug_assert_eq!(payload.len(), special_script_size(case));
    match case {
        0x00 => {
            // P2PKH
            let mut bytes = Vec::with_capacity(25);
            bytes.extend([OP_DUP, OP_HASH160, 20]);
            bytes.extend_from_slice(payload);
            bytes.extend([OP_EQUALVERIFY, OP_CHECKSIG]);
            Ok(ScriptBuf::from_bytes(bytes))
        }
        0x01 => {
            // P2SH
            let mut bytes = Vec::with_capacity(23);
            bytes.extend([OP_HASH160, 20]);
            bytes.extend_from_slice(payload);
            bytes.push(OP_EQUAL);
            Ok(ScriptBuf::from_bytes(bytes))
        }
        0x02 | 0x03 => {
            // P2PK (compressed)
            let mut bytes = Vec::with_capacity(35);
            bytes.push(opcodes::all::OP_PUSHBYTES_33.to_u8());
            bytes.push(case);
            bytes.extend_from_slice(payload);
            bytes.push(opcodes::all::OP_CHECKSIG.to_u8());
            Ok(ScriptBuf::from_bytes(bytes))
        }
        0x04 | 0x05 => {
            // P2PK (uncompressed): recover y from x and the case parity.
            let mut compressed_pubkey = Vec::with_capacity(33);
            compressed_pubkey.push(case - 2);
            compressed_pubkey.extend_from_slice(payload);

            let pubkey = bitcoin::PublicKey::from_slice(&compressed_pubkey)
                .map_err(|_| Error::InvalidPubkey)?;
            let uncompressed = pubkey.inner.serialize_uncompressed();

            let mut bytes = Vec::with_capacity(67);
            bytes.push(opcodes::all::OP_PUSHBYTES_65.to_u8());
            bytes.extend(uncompressed);
            bytes.push(opcodes::all::OP_CHECKSIG.to_u8());
            Ok(ScriptBuf::from_bytes(bytes))
        }
        _ => Err(Error::UnknownScriptTag(case)),
    }
}
