//! The send pipeline state machine.
//!
//! ```text
//! Unfunded -> Selected -> Built -> Signed -> Submitted -> Confirmed
//!                                                     \-> Rejected
//! ```
//!
//! Any non-terminal state may fall into `Failed(reason)`. Nothing is retried
//! or resumed: a finished pipeline can only [`restart`](SendPipeline::restart)
//! from `Unfunded`.

use std::fmt;

use tracing::debug;

use crate::WalletError;

/// Where a single send currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Unfunded,
    Selected,
    Built,
    Signed,
    Submitted,
    Confirmed,
    Rejected,
    Failed(String),
}

impl PipelineState {
    /// `Confirmed`, `Rejected` and `Failed` end a pipeline.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Confirmed | PipelineState::Rejected | PipelineState::Failed(_)
        )
    }

    fn allows(&self, next: &PipelineState) -> bool {
        use PipelineState::*;
        match (self, next) {
            (from, Failed(_)) => !from.is_terminal(),
            (Unfunded, Selected)
            | (Selected, Built)
            | (Built, Signed)
            | (Signed, Submitted)
            | (Submitted, Confirmed)
            | (Submitted, Rejected) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Unfunded => f.write_str("unfunded"),
            PipelineState::Selected => f.write_str("selected"),
            PipelineState::Built => f.write_str("built"),
            PipelineState::Signed => f.write_str("signed"),
            PipelineState::Submitted => f.write_str("submitted"),
            PipelineState::Confirmed => f.write_str("confirmed"),
            PipelineState::Rejected => f.write_str("rejected"),
            PipelineState::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// One send operation's progress, with every state it has passed through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendPipeline {
    history: Vec<PipelineState>,
}

impl Default for SendPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl SendPipeline {
    pub fn new() -> Self {
        Self {
            history: vec![PipelineState::Unfunded],
        }
    }

    pub fn state(&self) -> &PipelineState {
        // history always holds the initial state
        &self.history[self.history.len() - 1]
    }

    /// Every state entered so far, starting with `Unfunded`.
    pub fn transitions(&self) -> &[PipelineState] {
        &self.history
    }

    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    /// Move to `next`.
    ///
    /// # Returns
    /// `InvalidState` unless `next` directly follows the current state.
    pub fn advance(&mut self, next: PipelineState) -> Result<(), WalletError> {
        let from = self.state().clone();
        if !from.allows(&next) {
            return Err(WalletError::InvalidState { from, to: next });
        }
        debug!(from = %from, to = %next, "send pipeline transition");
        self.history.push(next);
        Ok(())
    }

    /// Move to `Failed(reason)`. A pipeline that already finished keeps its
    /// final state.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if !self.is_terminal() {
            let reason = reason.into();
            debug!(from = %self.state(), reason = %reason, "send pipeline failed");
            self.history.push(PipelineState::Failed(reason));
        }
    }

    /// Start over from `Unfunded`, discarding the history.
    ///
    /// # Returns
    /// `InvalidState` if the pipeline has not finished yet.
    pub fn restart(&mut self) -> Result<(), WalletError> {
        if !self.is_terminal() {
            return Err(WalletError::InvalidState {
                from: self.state().clone(),
                to: PipelineState::Unfunded,
            });
        }
        self.history = vec![PipelineState::Unfunded];
        Ok(())
    }
}
