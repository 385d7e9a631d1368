//! Network undo format.
//!
//! Carries the block hash, and for each retained coin the position of its
//! input in the block's flattened input list. The per-coin header is a
//! fixed-width u32 code word, unlike the VarInt the disk format uses.

use crate::coin::Coin;
use crate::undo::BlockUndo;
use crate::Result;
use bitcoin::hashes::Hash;
use bitcoin::{BlockHash, ScriptBuf};
use swiftsync_compressor::serialize::{read_varint, read_vec_len, write_compact_size, write_varint};
use swiftsync_compressor::{ReconstructableScript, compress_amount, decompress_amount};
use std::io::{Read, Write};

fn write_network_coin<W: Write>(writer: &mut W, coin: &Coin) -> Result<()> {
    writer.write_all(&(coin.code() as u32).to_le_bytes())?;
    write_varint(writer, compress_amount(coin.amount))?;
    ReconstructableScript(ScriptBuf::from_bytes(coin.script_pubkey.clone())).serialize(writer)?;
    Ok(())
}

fn read_network_coin<R: Read>(reader: &mut R) -> Result<Coin> {
    let mut code = [0u8; 4];
    reader.read_exact(&mut code)?;
    let code = u32::from_le_bytes(code);
    let amount = decompress_amount(read_varint(reader)?);
    let script = ReconstructableScript::deserialize(reader)?;
    Ok(Coin {
        is_coinbase: code & 1 == 1,
        amount,
        height: code >> 1,
        script_pubkey: script.0.into_bytes(),
    })
}

/// A spent coin tagged with the position of the spending input within the
/// block's flattened input list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputCoin {
    pub index: u32,
    pub coin: Coin,
}

impl InputCoin {
    fn serialize<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.index.to_le_bytes())?;
        write_network_coin(writer, &self.coin)
    }

    fn deserialize<R: Read>(reader: &mut R) -> Result<Self> {
        let mut index = [0u8; 4];
        reader.read_exact(&mut index)?;
        Ok(Self {
            index: u32::from_le_bytes(index),
            coin: read_network_coin(reader)?,
        })
    }
}

/// Undo data for one block as relayed to peers, optionally filtered by a
/// height cutoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkBlockUndo {
    pub block_hash: BlockHash,
    pub coins: Vec<InputCoin>,
}

impl NetworkBlockUndo {
    /// Flattens the undo coins in input order, retaining a coin iff the
    /// cutoff is zero or its height is below the cutoff. Indices count all
    /// coins, filtered or not, so they keep their original positions.
    pub fn new(block_hash: BlockHash, undo: &BlockUndo, cutoff: u32) -> Self {
        let mut coins = Vec::new();
        let mut index: u32 = 0;
        for tx_undo in &undo.tx_undos {
            for coin in &tx_undo.prevouts {
                if cutoff == 0 || coin.height < cutoff {
                    coins.push(InputCoin {
                        index,
                        coin: coin.clone(),
                    });
                }
                index += 1;
            }
        }
        Self { block_hash, coins }
    }

    pub fn serialize<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(self.block_hash.as_byte_array())?;
        write_compact_size(writer, self.coins.len() as u64)?;
        for coin in &self.coins {
            coin.serialize(writer)?;
        }
        Ok(())
    }

    pub fn deserialize<R: Read>(reader: &mut R) -> Result<Self> {
        let mut hash = [0u8; 32];
        reader.read_exact(&mut hash)?;
        let count = read_vec_len(reader)?;
        let mut coins = Vec::with_capacity(count as usize);
        for _ in 0..count {
            coins.push(InputCoin::deserialize(reader)?);
        }
        Ok(Self {
            block_hash: BlockHash::from_byte_array(hash),
            coins,
        })
    }
}
