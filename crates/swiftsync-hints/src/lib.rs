//! Unspentness hints for an accelerated initial block download.
//!
//! A full node enumerates each block's outputs and records which of them
//! are still unspent at a frozen terminal height. The per-block index
//! lists land in a random-access hints file ([`file`]), compressed with
//! Elias-Fano coding ([`elias_fano`]). A syncing node replays blocks while
//! feeding a salted additive fingerprint ([`swiftsync_crypto::Aggregate`])
//! that must balance to zero at the terminal height ([`session`]).

pub mod elias_fano;
mod error;
pub mod file;
pub mod session;
#[cfg(test)]
mod tests;

pub use self::elias_fano::EliasFano;
pub use self::error::Error;
pub use self::file::{HintsFileReader, HintsFileWriter, PayloadEncoding};
pub use self::session::{SessionState, SyncSession};

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;
