//! The accelerated-sync session.
//!
//! A session consumes the hints file while blocks are applied in order.
//! Outputs whose flattened index appears in the block's hint list stay
//! unspent through the terminal height and are skipped; every other
//! created outpoint is added to the aggregate, and every consumed outpoint
//! is spent from it. A balanced aggregate at the stop height confirms the
//! replay matched the hints.

use crate::file::HintsFileReader;
use crate::{Error, Result};
use bitcoin::OutPoint;
use swiftsync_crypto::Aggregate;

/// Lifecycle of a sync session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No hints loaded.
    Inactive,
    /// Hints loaded and a genesis start confirmed; no block processed yet.
    Armed,
    /// Blocks are being processed.
    Running,
    /// The block at the stop height was processed and the aggregate
    /// balanced.
    Completed,
    /// The aggregate did not balance at the stop height; the host must
    /// fall back to a non-accelerated sync.
    Failed,
}

/// Drives the aggregate from per-block hints.
pub struct SyncSession {
    state: SessionState,
    hints: Option<HintsFileReader>,
    aggregate: Aggregate,
    stop_height: u32,
}

impl Default for SyncSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Inactive,
            hints: None,
            aggregate: Aggregate::new(),
            stop_height: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Terminal height of the accelerated phase; zero while inactive.
    pub fn stop_height(&self) -> u32 {
        self.stop_height
    }

    /// Arms the session. The host must assert that the sync starts from
    /// genesis; hints cannot vouch for outputs created before the session
    /// began observing.
    pub fn arm(&mut self, starting_from_genesis: bool, hints: HintsFileReader) -> Result<()> {
        if self.state != SessionState::Inactive {
            return Err(Error::InvalidTransition(self.state));
        }
        if !starting_from_genesis {
            return Err(Error::NotFromGenesis);
        }
        self.stop_height = hints.stop_height();
        self.hints = Some(hints);
        self.state = SessionState::Armed;
        tracing::info!(stop_height = self.stop_height, "accelerated sync armed");
        Ok(())
    }

    /// Processes one connected block.
    ///
    /// `created` is the block's flattened output list in order; `spent`
    /// holds the prevouts its inputs consumed (empty for a pure-coinbase
    /// block). Returns the state after the block, transitioning to
    /// `Completed` or `Failed` at the stop height.
    pub fn process_block(
        &mut self,
        height: u32,
        created: &[OutPoint],
        spent: &[OutPoint],
    ) -> Result<SessionState> {
        match self.state {
            SessionState::Armed => self.state = SessionState::Running,
            SessionState::Running => {}
            state => return Err(Error::InvalidTransition(state)),
        }

        let hints = self
            .hints
            .as_mut()
            .expect("armed session always holds a reader; qed");
        let unspent = hints.read_block(height)?;

        let mut next_unspent = unspent.iter().copied().peekable();
        for (position, outpoint) in created.iter().enumerate() {
            if next_unspent.peek() == Some(&(position as u32)) {
                // Still unspent at the stop height; never enters the
                // aggregate.
                next_unspent.next();
                continue;
            }
            self.aggregate.add(outpoint);
        }
        for outpoint in spent {
            self.aggregate.spend(outpoint);
        }

        if height == self.stop_height {
            if self.aggregate.is_zero() {
                self.state = SessionState::Completed;
                tracing::info!(height, "accelerated sync completed");
            } else {
                self.state = SessionState::Failed;
                tracing::error!(height, "aggregate did not balance at the stop height");
                return Err(Error::AggregateNonZero { height });
            }
        }
        Ok(self.state)
    }
}
