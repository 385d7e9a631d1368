//! On-disk undo format.
//!
//! Per coin: `VarInt(2 * height + coinbase)`, one zero byte when the height
//! is positive (older versions stored the spend version there), then the
//! compressed output. Transactions and blocks wrap their coin lists in
//! compact-size-prefixed vectors.

use crate::coin::Coin;
use crate::Result;
use bitcoin::ScriptBuf;
use swiftsync_compressor::serialize::{read_varint, read_vec_len, write_compact_size, write_varint};
use swiftsync_compressor::{ScriptCompression, compress_amount, decompress_amount};
use std::io::{Read, Write};

fn write_coin<W: Write>(writer: &mut W, coin: &Coin) -> Result<()> {
    write_varint(writer, coin.code())?;
    if coin.height > 0 {
        // Required to maintain compatibility with the older undo format.
        writer.write_all(&[0x00])?;
    }
    write_varint(writer, compress_amount(coin.amount))?;
    ScriptCompression(ScriptBuf::from_bytes(coin.script_pubkey.clone())).serialize(writer)?;
    Ok(())
}

fn read_coin<R: Read>(reader: &mut R) -> Result<Coin> {
    let code = read_varint(reader)?;
    let height = (code >> 1) as u32;
    let is_coinbase = code & 1 == 1;
    if height > 0 {
        // Old versions stored the version number for the last spend of a
        // transaction's outputs; non-final spends were indicated with
        // height zero.
        let _dummy = read_varint(reader)?;
    }
    let amount = decompress_amount(read_varint(reader)?);
    let script = ScriptCompression::deserialize(reader)?;
    Ok(Coin {
        is_coinbase,
        amount,
        height,
        script_pubkey: script.0.into_bytes(),
    })
}

/// Undo information for a single transaction: the previous outputs it
/// spent, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxUndo {
    pub prevouts: Vec<Coin>,
}

impl TxUndo {
    pub fn new(prevouts: Vec<Coin>) -> Self {
        Self { prevouts }
    }

    pub fn serialize<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_compact_size(writer, self.prevouts.len() as u64)?;
        for coin in &self.prevouts {
            write_coin(writer, coin)?;
        }
        Ok(())
    }

    pub fn deserialize<R: Read>(reader: &mut R) -> Result<Self> {
        let count = read_vec_len(reader)?;
        let mut prevouts = Vec::with_capacity(count as usize);
        for _ in 0..count {
            prevouts.push(read_coin(reader)?);
        }
        Ok(Self { prevouts })
    }
}

/// Undo information for a block: one record per transaction, coinbase
/// excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockUndo {
    pub tx_undos: Vec<TxUndo>,
}

impl BlockUndo {
    pub fn new(tx_undos: Vec<TxUndo>) -> Self {
        Self { tx_undos }
    }

    /// Record the spent prevouts of the next transaction.
    pub fn push_tx(&mut self, tx_undo: TxUndo) {
        self.tx_undos.push(tx_undo);
    }

    /// Total number of coins across all transactions.
    pub fn coin_count(&self) -> usize {
        self.tx_undos.iter().map(|tx| tx.prevouts.len()).sum()
    }

    /// Returns true if no spends were recorded.
    pub fn is_empty(&self) -> bool {
        self.tx_undos.is_empty()
    }

    pub fn serialize<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_compact_size(writer, self.tx_undos.len() as u64)?;
        for tx_undo in &self.tx_undos {
            tx_undo.serialize(writer)?;
        }
        Ok(())
    }

    pub fn deserialize<R: Read>(reader: &mut R) -> Result<Self> {
        let count = read_vec_len(reader)?;
        let mut tx_undos = Vec::with_capacity(count as usize);
        for _ in 0..count {
            tx_undos.push(TxUndo::deserialize(reader)?);
        }
        Ok(Self { tx_undos })
    }
}
