//! Error types for the output codecs.

/// Errors raised while encoding or decoding the compact output formats.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// VarInt decoding shifted past 64 bits.
    #[error("varint exceeds 64 bits")]
    VarIntOverflow,

    /// Compact size too large to prefix any supported vector.
    #[error("compact size too large: {0}")]
    CompactSizeTooLarge(u64),

    /// P2PK decompression asked to rebuild a pubkey from an x-coordinate
    /// that is not on the curve.
    #[error("invalid public key in compressed script")]
    InvalidPubkey,

    /// Tag byte outside the closed set of script encodings.
    #[error("unknown script tag: {0:#04x}")]
    UnknownScriptTag(u8),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
