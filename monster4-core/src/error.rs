//! Error type shared by every engine operation.

use thiserror::Error;

use crate::game::TurnPhase;
use crate::{DieFace, Pos};

/// Every way an engine call can be refused.
///
/// None of these are fatal: the state is left untouched and the caller
/// decides how to recover (re-prompt, re-sample, forfeit the turn).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("coordinate ({row},{col}) is outside the 4x4 board")]
    OutOfBounds { row: i64, col: i64 },
    /// A raw `Pos` index past the last cell.
    #[error("position index {0} is outside 0-15")]
    InvalidIndex(u8),
    #[error("placement at {pos} is not legal here")]
    IllegalPlacement { pos: Pos },
    #[error("no skeletons left in the reserve")]
    ReserveExhausted,
    #[error("no legal placements for {face}")]
    NoLegalMoves { face: DieFace },
    #[error("action not allowed while {phase:?}")]
    UnexpectedPhase { phase: TurnPhase },
    /// Skipping is only for turns with nothing to play.
    #[error("cannot skip the turn, {count} legal placements remain")]
    MovesAvailable { count: usize },
    #[error("malformed coordinate [{0}], expected row,col")]
    MalformedCoord(String),
    #[error("inconsistent game state: {0}")]
    CorruptState(&'static str),
}
