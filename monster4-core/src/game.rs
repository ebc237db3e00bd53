//! Game state and turn flow.
//!
//! `GameState` owns one game: the grid, the skeleton reserve, whose turn it
//! is, the outcome, and where the current turn stands. Each game is an
//! independent value; nothing is shared between games.
//!
//! # Turn Flow
//!
//! ```text
//!   AwaitingRoll --roll(face)--> AwaitingPlacement(face) --place(pos)--> AwaitingRoll
//!        ^   |                          |
//!        |   +--roll(GraveyardShift)----+--skip_turn() (empty legal set)
//!        +--------------------------------------------------------------+
//! ```
//!
//! The turn passes only when a turn completes. A roll with nothing to place
//! still waits in `AwaitingPlacement` and reports `RollOutcome::NoLegalMoves`.
//! Every rejected call leaves the state exactly as it was.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    Board, Cell, DieFace, EngineError, Player, Pos, PosSet, BOARD_SIZE, STARTING_SKELETONS,
};

/// Result of the game so far.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum Outcome {
    InProgress,
    Won(Player),
}

/// Where the current turn stands.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum TurnPhase {
    AwaitingRoll,
    AwaitingPlacement(DieFace),
}

/// What a successful roll leads to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RollOutcome {
    /// Pick one of `legal` and pass it to `GameState::place`.
    AwaitingPlacement { face: DieFace, legal: PosSet },
    /// The face needed no placement; the turn is over.
    TurnComplete(TurnReport),
    /// Nothing can be placed for `face`. The turn waits for `skip_turn`.
    NoLegalMoves { face: DieFace },
}

/// Summary of a completed turn.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TurnReport {
    pub player: Player,
    pub face: DieFace,
    /// Where a monster or skeleton went, `None` for no-op and forfeited turns.
    pub placed: Option<Pos>,
    pub outcome: Outcome,
}

/// Read-only view of a game for rendering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub cells: [[Cell; 4]; 4],
    pub reserve: u8,
    pub to_move: Player,
    pub outcome: Outcome,
    pub phase: TurnPhase,
    pub winning_line: Option<[Pos; 4]>,
}

/// A single Monster 4 game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GameStateFields")]
pub struct GameState {
    board: Board,
    reserve: u8,
    to_move: Player,
    outcome: Outcome,
    phase: TurnPhase,
}

/// Deserialized form; the outcome is recomputed and the skeleton count checked.
#[derive(Deserialize)]
struct GameStateFields {
    board: Board,
    reserve: u8,
    to_move: Player,
    phase: TurnPhase,
}

impl TryFrom<GameStateFields> for GameState {
    type Error = EngineError;

    fn try_from(fields: GameStateFields) -> Result<GameState, EngineError> {
        let mut state = GameState::from_parts(fields.board, fields.reserve, fields.to_move)?;
        state.phase = fields.phase;
        Ok(state)
    }
}

impl GameState {
    /// Fresh game: empty grid, full reserve, Player One to move.
    pub fn new() -> GameState {
        GameState::starting_with(Player::One)
    }

    /// Fresh game with the given player to move first.
    pub fn starting_with(first: Player) -> GameState {
        GameState {
            board: Board::new(),
            reserve: STARTING_SKELETONS,
            to_move: first,
            outcome: Outcome::InProgress,
            phase: TurnPhase::AwaitingRoll,
        }
    }

    /// Build a position directly, e.g. for analysis or tests.
    ///
    /// Rejects boards whose skeletons plus the reserve exceed the starting
    /// supply. The turn starts at `AwaitingRoll`.
    pub fn from_parts(
        board: Board,
        reserve: u8,
        to_move: Player,
    ) -> Result<GameState, EngineError> {
        if board.skeletons_on_board() as u16 + reserve as u16 > STARTING_SKELETONS as u16 {
            return Err(EngineError::CorruptState("more skeletons than the game starts with"));
        }
        let mut state = GameState {
            board,
            reserve,
            to_move,
            outcome: Outcome::InProgress,
            phase: TurnPhase::AwaitingRoll,
        };
        state.refresh_outcome();
        Ok(state)
    }

    // ========== Accessors ==========

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Skeletons not yet placed.
    #[inline]
    pub fn reserve(&self) -> u8 {
        self.reserve
    }

    #[inline]
    pub fn skeletons_on_board(&self) -> u8 {
        self.board.skeletons_on_board()
    }

    #[inline]
    pub fn current_player(&self) -> Player {
        self.to_move
    }

    #[inline]
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    #[inline]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn winner(&self) -> Option<Player> {
        self.board.winner()
    }

    pub fn winning_line(&self) -> Option<(Player, [Pos; 4])> {
        self.board.winning_line()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            cells: self.board.rows(),
            reserve: self.reserve,
            to_move: self.to_move,
            outcome: self.outcome,
            phase: self.phase,
            winning_line: self.board.winning_line().map(|(_, line)| line),
        }
    }

    // ========== Legality ==========

    /// Cells a monster can go on for a grave face.
    pub fn valid_placements(&self, face: DieFace) -> PosSet {
        self.board.valid_placements(face)
    }

    /// Cells a skeleton can go on.
    pub fn empty_placements(&self) -> PosSet {
        self.board.empty_placements()
    }

    /// Legal targets for any face.
    ///
    /// `SkeletonMove` has no targets once the reserve is spent, and
    /// `GraveyardShift` never places anything.
    pub fn legal_placements(&self, face: DieFace) -> PosSet {
        match face {
            DieFace::LightGrave | DieFace::DarkGrave | DieFace::AnyGrave => {
                self.board.valid_placements(face)
            }
            DieFace::SkeletonMove if self.reserve == 0 => PosSet::EMPTY,
            DieFace::SkeletonMove => self.board.empty_placements(),
            DieFace::GraveyardShift => PosSet::EMPTY,
        }
    }

    /// Legal targets for the face rolled this turn; empty before a roll.
    pub fn legal_moves(&self) -> PosSet {
        match self.phase {
            TurnPhase::AwaitingRoll => PosSet::EMPTY,
            TurnPhase::AwaitingPlacement(face) => self.legal_placements(face),
        }
    }

    // ========== Placement ==========

    /// Put `player`'s monster at (row, col), replacing an empty cell or a
    /// skeleton.
    ///
    /// Grave colors are not checked here; that is the turn flow's job.
    /// Cells holding a monster are refused since no face allows them.
    pub fn place_monster(&mut self, row: u8, col: u8, player: Player) -> Result<(), EngineError> {
        let pos = Pos::try_from_row_col(row, col)?;
        self.put_monster(pos, player)
    }

    /// Move one skeleton from the reserve onto the empty cell at (row, col).
    pub fn place_skeleton(&mut self, row: u8, col: u8) -> Result<(), EngineError> {
        let pos = Pos::try_from_row_col(row, col)?;
        self.put_skeleton(pos)
    }

    fn put_monster(&mut self, pos: Pos, player: Player) -> Result<(), EngineError> {
        if !self.board.cell(pos).accepts_monster() {
            return Err(EngineError::IllegalPlacement { pos });
        }
        self.board.set_cell(pos, player.into());
        log::debug!("{} placed at {pos}", player.symbol());
        self.refresh_outcome();
        Ok(())
    }

    fn put_skeleton(&mut self, pos: Pos) -> Result<(), EngineError> {
        if self.reserve == 0 {
            return Err(EngineError::ReserveExhausted);
        }
        if !self.board.is_empty(pos) {
            return Err(EngineError::IllegalPlacement { pos });
        }
        self.board.set_cell(pos, Cell::Skeleton);
        self.reserve -= 1;
        log::debug!("skeleton placed at {pos}, {} left in reserve", self.reserve);
        self.refresh_outcome();
        Ok(())
    }

    fn refresh_outcome(&mut self) {
        let outcome = match self.board.winner() {
            Some(player) => Outcome::Won(player),
            None => Outcome::InProgress,
        };
        if outcome != self.outcome {
            if let Outcome::Won(player) = outcome {
                log::debug!("{} completes a line", player.symbol());
            }
        }
        self.outcome = outcome;
    }

    // ========== Turn Flow ==========

    /// Start the current player's turn with a rolled face.
    ///
    /// `GraveyardShift` has no rules yet and ends the turn as a no-op. Other
    /// faces wait for a placement; when nothing can be placed (including a
    /// skeleton move with an empty reserve) the turn still waits and the
    /// caller forfeits it with `skip_turn`. Only a roll out of turn order
    /// is an error, and it changes nothing.
    pub fn roll(&mut self, face: DieFace) -> Result<RollOutcome, EngineError> {
        if self.phase != TurnPhase::AwaitingRoll {
            return Err(EngineError::UnexpectedPhase { phase: self.phase });
        }
        log::debug!("{} rolled {face}", self.to_move.symbol());

        if face == DieFace::GraveyardShift {
            return Ok(RollOutcome::TurnComplete(self.finish_turn(face, None)));
        }

        self.phase = TurnPhase::AwaitingPlacement(face);
        let legal = self.legal_placements(face);
        if legal.is_empty() {
            log::debug!("nothing to place for {face}");
            return Ok(RollOutcome::NoLegalMoves { face });
        }
        Ok(RollOutcome::AwaitingPlacement { face, legal })
    }

    /// Complete the turn by placing at `pos`, which must be in the legal
    /// set for the rolled face.
    pub fn place(&mut self, pos: Pos) -> Result<TurnReport, EngineError> {
        let face = match self.phase {
            TurnPhase::AwaitingPlacement(face) => face,
            phase => return Err(EngineError::UnexpectedPhase { phase }),
        };
        if !pos.is_valid() {
            return Err(EngineError::InvalidIndex(pos.0));
        }
        if face == DieFace::SkeletonMove && self.reserve == 0 {
            return Err(EngineError::ReserveExhausted);
        }
        let legal = self.legal_placements(face);
        if legal.is_empty() {
            return Err(EngineError::NoLegalMoves { face });
        }
        if !legal.contains(pos) {
            log::debug!("rejected {pos} for {face}");
            return Err(EngineError::IllegalPlacement { pos });
        }

        match face {
            DieFace::LightGrave | DieFace::DarkGrave | DieFace::AnyGrave => {
                self.put_monster(pos, self.to_move)?
            }
            DieFace::SkeletonMove => self.put_skeleton(pos)?,
            DieFace::GraveyardShift => return Err(EngineError::IllegalPlacement { pos }),
        }
        Ok(self.finish_turn(face, Some(pos)))
    }

    /// `place` from raw coordinates.
    pub fn place_at(&mut self, row: u8, col: u8) -> Result<TurnReport, EngineError> {
        self.place(Pos::try_from_row_col(row, col)?)
    }

    /// Forfeit a turn that has nothing to place.
    pub fn skip_turn(&mut self) -> Result<TurnReport, EngineError> {
        let face = match self.phase {
            TurnPhase::AwaitingPlacement(face) => face,
            phase => return Err(EngineError::UnexpectedPhase { phase }),
        };
        let legal = self.legal_placements(face);
        if !legal.is_empty() {
            return Err(EngineError::MovesAvailable { count: legal.len() });
        }
        log::debug!("{} forfeits {face}", self.to_move.symbol());
        Ok(self.finish_turn(face, None))
    }

    fn finish_turn(&mut self, face: DieFace, placed: Option<Pos>) -> TurnReport {
        let report = TurnReport {
            player: self.to_move,
            face,
            placed,
            outcome: self.outcome,
        };
        self.to_move = self.to_move.opponent();
        self.phase = TurnPhase::AwaitingRoll;
        report
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

/// Board layout: the reserve row first, then the grid under a column header.
impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for col in 0..BOARD_SIZE {
            write!(f, " {col:<2}")?;
        }
        writeln!(f)?;

        write!(f, "S: ")?;
        for slot in 0..STARTING_SKELETONS {
            let cell = if slot < self.reserve { Cell::Skeleton } else { Cell::Empty };
            write!(f, " {:<2}", cell.symbol())?;
        }
        writeln!(f)?;

        for (row, cells) in self.board.rows().iter().enumerate() {
            write!(f, "{row}  ")?;
            for cell in cells {
                write!(f, " {:<2}", cell.symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
