//! # Pipeline State
//!
//! Per-invocation state machine of the derivation pipeline.
//!
//! # State Machine
//!
//! ```text
//! FetchingRates → Converting → Computing → Assembled
//!       ↓
//!     Failed
//! ```
//!
//! Only `FetchingRates` talks to the network, so it is the only state from
//! which a run can fail.
//!
//! # Examples
//!
//! ```
//! use portfolio_derivations::domain::value_objects::pipeline_state::{PipelineState, StateTrail};
//!
//! let mut trail = StateTrail::new();
//! trail.advance(PipelineState::Converting).unwrap();
//! assert!(trail.advance(PipelineState::Failed).is_err());
//! assert_eq!(trail.current(), PipelineState::Converting);
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Derivation pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum PipelineState {
    /// Waiting on the FX rate provider.
    #[default]
    FetchingRates = 0,

    /// Converting monetary fields into target currencies.
    Converting = 1,

    /// Computing derived metrics.
    Computing = 2,

    /// Result assembled (terminal).
    Assembled = 3,

    /// Rates could not be obtained (terminal).
    Failed = 4,
}

impl PipelineState {
    /// Returns true if this is a terminal state.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Assembled | Self::Failed)
    }

    /// Returns true if this state can transition to the target state.
    ///
    /// # Examples
    ///
    /// ```
    /// use portfolio_derivations::domain::value_objects::pipeline_state::PipelineState;
    ///
    /// assert!(PipelineState::FetchingRates.can_transition_to(PipelineState::Failed));
    /// assert!(!PipelineState::Computing.can_transition_to(PipelineState::Failed));
    /// ```
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::FetchingRates, Self::Converting)
                | (Self::FetchingRates, Self::Failed)
                | (Self::Converting, Self::Computing)
                | (Self::Computing, Self::Assembled)
        )
    }

    /// Returns the numeric value of this state.
    #[inline]
    #[must_use]
    pub const fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::FetchingRates => "FETCHING_RATES",
            Self::Converting => "CONVERTING",
            Self::Computing => "COMPUTING",
            Self::Assembled => "ASSEMBLED",
            Self::Failed => "FAILED",
        };
        write!(f, "{s}")
    }
}

/// Ordered record of the states one run has passed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTrail {
    states: Vec<PipelineState>,
}

impl StateTrail {
    /// Starts a trail in `FetchingRates`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: vec![PipelineState::FetchingRates],
        }
    }

    /// Moves to `target`, enforcing the state machine.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` if the transition is not allowed.
    pub fn advance(&mut self, target: PipelineState) -> DomainResult<()> {
        let from = self.current();
        if !from.can_transition_to(target) {
            return Err(DomainError::InvalidStateTransition { from, to: target });
        }
        tracing::debug!(from = %from, to = %target, "pipeline transition");
        self.states.push(target);
        Ok(())
    }

    /// Current state.
    #[must_use]
    pub fn current(&self) -> PipelineState {
        self.states
            .last()
            .copied()
            .unwrap_or(PipelineState::FetchingRates)
    }

    /// All visited states, oldest first.
    #[inline]
    #[must_use]
    pub fn states(&self) -> &[PipelineState] {
        &self.states
    }
}

impl Default for StateTrail {
    fn default() -> Self {
        Self::new()
    }
}
