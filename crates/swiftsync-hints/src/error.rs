//! Error types for the hints file and the sync session.

use crate::session::SessionState;

/// Errors raised by the hints file and the sync session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Hints file does not start with the expected magic bytes.
    #[error("invalid hints file magic (expected {expected:02x?}, got {got:02x?})")]
    MalformedHeader { expected: [u8; 4], got: [u8; 4] },

    /// Hints file version byte selects no known payload encoding.
    #[error("unsupported hints file version: {0:#04x}")]
    UnsupportedVersion(u8),

    /// Every preallocated directory slot has been written.
    #[error("hints directory full ({0} entries preallocated)")]
    DirectoryFull(u32),

    /// No payload recorded for the requested height.
    #[error("no hints recorded for height {0}")]
    HeightNotPresent(u32),

    /// Payload bytes do not decode under the file's encoding.
    #[error("malformed hints payload: {0}")]
    MalformedPayload(&'static str),

    /// Operation not accepted in the session's current state.
    #[error("invalid session transition from {0:?}")]
    InvalidTransition(SessionState),

    /// The host is not starting from an empty chain state.
    #[error("an accelerated sync must start from genesis")]
    NotFromGenesis,

    /// The fingerprint did not balance at the stop height; the hints file
    /// or the block data is corrupt.
    #[error("aggregate not zero at stop height {height}")]
    AggregateNonZero { height: u32 },

    /// Compact size or varint error.
    #[error("codec error: {0}")]
    Codec(#[from] swiftsync_compressor::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
