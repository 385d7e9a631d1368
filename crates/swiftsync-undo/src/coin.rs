//! The unspent-output record the undo encodings carry.

/// A transaction output together with its creation metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coin {
    /// Whether the coin is from a coinbase transaction.
    pub is_coinbase: bool,
    /// Transfer value in the smallest unit.
    pub amount: u64,
    /// Block height at which the containing transaction was included.
    pub height: u32,
    /// Spending condition of the output.
    pub script_pubkey: Vec<u8>,
}

impl Coin {
    pub fn new(is_coinbase: bool, amount: u64, height: u32, script_pubkey: Vec<u8>) -> Self {
        Self {
            is_coinbase,
            amount,
            height,
            script_pubkey,
        }
    }

    /// Height and coinbase flag packed into the single code word both undo
    /// encodings store.
    pub(crate) fn code(&self) -> u64 {
        ((self.height as u64) << 1) | self.is_coinbase as u64
    }
}
