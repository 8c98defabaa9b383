//! Per-item processing state machine.
//!
//! ```text
//! Pending -> Decoding -> Reprojecting -> ColorProcessing -> Encoding -> Done
//!    |          |             |                |              |
//!    +----------+-------------+----------------+--------------+--> Failed
//!
//! Pending -> Done   (skip-if-exists)
//! ```

use crate::BatchError;
use std::path::PathBuf;

/// Stage an item is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ItemState {
    /// Queued, not started.
    #[default]
    Pending,
    /// Reading the input file.
    Decoding,
    /// Mapping onto the output lens.
    Reprojecting,
    /// Exposure and tonemapping.
    ColorProcessing,
    /// Writing output files.
    Encoding,
    /// Finished (or skipped).
    Done,
    /// Aborted with an error.
    Failed,
}

impl ItemState {
    /// Returns `true` for `Done` and `Failed`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// The stage that normally follows this one.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Decoding),
            Self::Decoding => Some(Self::Reprojecting),
            Self::Reprojecting => Some(Self::ColorProcessing),
            Self::ColorProcessing => Some(Self::Encoding),
            Self::Encoding => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    /// Whether `self -> next` is a legal transition.
    ///
    /// Transitions only move forward one stage at a time. Any non-terminal
    /// state may fail, and a pending item may go straight to `Done` when it
    /// is skipped.
    pub fn can_advance_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (_, Self::Failed) => true,
            (Self::Pending, Self::Done) => true,
            _ => self.next() == Some(next),
        }
    }
}

/// Final result of one item.
#[derive(Debug)]
pub enum Outcome {
    /// All requested outputs exist.
    Done {
        /// Outputs were already present; nothing was decoded.
        skipped: bool,
    },
    /// Processing stopped at `stage`.
    Failed {
        /// Stage that was running when the error occurred.
        stage: ItemState,
        /// The error.
        error: BatchError,
    },
}

/// Report sent by a worker when its item reaches a terminal state.
#[derive(Debug)]
pub struct ItemReport {
    /// Input path.
    pub path: PathBuf,
    /// How the item ended.
    pub outcome: Outcome,
    /// Every state the item visited, starting at `Pending`.
    pub trace: Vec<ItemState>,
}

impl ItemReport {
    /// Returns `true` if the item finished (processed or skipped).
    #[inline]
    pub fn is_done(&self) -> bool {
        matches!(self.outcome, Outcome::Done { .. })
    }

    /// Returns `true` if the item was skipped.
    #[inline]
    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, Outcome::Done { skipped: true })
    }
}

/// Tracks an item's current state and the states it has visited.
#[derive(Debug)]
pub(crate) struct Tracker {
    state: ItemState,
    trace: Vec<ItemState>,
}

impl Tracker {
    pub(crate) fn new() -> Self {
        Self {
            state: ItemState::Pending,
            trace: vec![ItemState::Pending],
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> ItemState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: ItemState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
        self.trace.push(next);
    }

    pub(crate) fn into_trace(self) -> Vec<ItemState> {
        self.trace
    }
}
