//! Error types for the undo encodings.

/// Errors raised while encoding or decoding undo data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Compressed amount or script failed to encode or decode.
    #[error("codec error: {0}")]
    Codec(#[from] swiftsync_compressor::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
