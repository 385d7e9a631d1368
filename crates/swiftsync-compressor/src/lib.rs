//! Compact binary codecs for serialized transaction outputs.
//!
//! Standard output scripts are reduced to a short tagged payload, amounts
//! are shrunk with a base-10 mantissa/exponent scheme, and everything else
//! falls back to a size-prefixed raw encoding. Two variable-length integer
//! encodings are provided in [`serialize`]; they are distinct formats and
//! must not be mixed up.

mod compressor;
mod error;
mod reconstructable;
mod script;
pub mod serialize;

pub use self::compressor::{
    CompressedScript, MAX_MONEY, compress_amount, compress_script, decompress_amount,
    decompress_script, special_script_size,
};
pub use self::error::Error;
pub use self::reconstructable::{ReconstructableScript, ScriptTag};
pub use self::script::{MAX_SCRIPT_SIZE, ScriptCompression};

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;
