//! Spent-coin (undo) encodings.
//!
//! When a block is applied, the previous outputs it consumed are packed so
//! the block can be rolled back later. Two encodings exist: the on-disk
//! format used by the rollback store, and a network variant that carries a
//! block identifier, a per-input index tag, and a height filter. They
//! overlap in content but not in layout, so they do not share types.

mod coin;
mod error;
mod network;
mod undo;

pub use self::coin::Coin;
pub use self::error::Error;
pub use self::network::{InputCoin, NetworkBlockUndo};
pub use self::undo::{BlockUndo, TxUndo};

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;
