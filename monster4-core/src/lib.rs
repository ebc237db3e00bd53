//! Monster 4 rules engine with a bit-packed board.
//!
//! Players roll a die, place monsters on graves of the rolled color, drop
//! wildcard skeletons from a shared reserve, and race to fill a row or
//! column with their monsters.
//!
//! # Board Encoding (32-bit)
//!
//! ```text
//! Bits 0-31: Board state (16 cells × 2 bits per cell)
//!
//! Each cell (2 bits):
//!   0 = Empty
//!   1 = Player One monster (M1)
//!   2 = Player Two monster (M2)
//!   3 = Skeleton
//!
//! Cell indices (row-major order):
//!   (0,0)=0   (0,1)=1   (0,2)=2   (0,3)=3
//!   (1,0)=4   (1,1)=5   (1,2)=6   (1,3)=7
//!   (2,0)=8   (2,1)=9   (2,2)=10  (2,3)=11
//!   (3,0)=12  (3,1)=13  (3,2)=14  (3,3)=15
//! ```
//!
//! # Grave Colors
//!
//! ```text
//!   L L D D
//!   L L D D
//!   D D L L
//!   D D L L
//! ```
//!
//! The skeleton reserve and turn bookkeeping live on [`GameState`], which
//! is the only type that mutates a game.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

mod error;
mod game;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use crate::error::EngineError;
pub use crate::game::{GameState, Outcome, RollOutcome, Snapshot, TurnPhase, TurnReport};

/// Width and height of the playing grid.
pub const BOARD_SIZE: u8 = 4;
/// Number of cells on the grid.
pub const CELL_COUNT: usize = 16;
/// Skeletons in the reserve at the start of a game.
pub const STARTING_SKELETONS: u8 = 4;

/// Player identifier.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Player {
    One = 1,
    Two = 2,
}

impl Player {
    /// Get the opponent player.
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Convert from u8 (1 or 2) to Player.
    #[inline]
    pub fn from_bits(bits: u8) -> Option<Player> {
        match bits {
            1 => Some(Player::One),
            2 => Some(Player::Two),
            _ => None,
        }
    }

    /// Board symbol for this player's monsters.
    pub fn symbol(self) -> &'static str {
        match self {
            Player::One => "M1",
            Player::Two => "M2",
        }
    }
}

/// Contents of a single grid cell.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Cell {
    Empty = 0,
    Player1 = 1,
    Player2 = 2,
    Skeleton = 3,
}

impl Cell {
    #[inline]
    const fn from_bits(bits: u32) -> Cell {
        match bits & 0b11 {
            0 => Cell::Empty,
            1 => Cell::Player1,
            2 => Cell::Player2,
            _ => Cell::Skeleton,
        }
    }

    /// The player owning a monster in this cell, if any.
    #[inline]
    pub fn owner(self) -> Option<Player> {
        match self {
            Cell::Player1 => Some(Player::One),
            Cell::Player2 => Some(Player::Two),
            Cell::Empty | Cell::Skeleton => None,
        }
    }

    /// Cells a monster may be placed into (never over another monster).
    #[inline]
    pub fn accepts_monster(self) -> bool {
        matches!(self, Cell::Empty | Cell::Skeleton)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Cell::Empty => ".",
            Cell::Skeleton => "S",
            Cell::Player1 => Player::One.symbol(),
            Cell::Player2 => Player::Two.symbol(),
        }
    }
}

impl From<Player> for Cell {
    fn from(player: Player) -> Cell {
        match player {
            Player::One => Cell::Player1,
            Player::Two => Cell::Player2,
        }
    }
}

/// Position on the 4x4 board (0-15).
///
/// Layout:
/// ```text
///    0  1  2  3
///    4  5  6  7
///    8  9 10 11
///   12 13 14 15
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos(pub u8);

impl Pos {
    /// Create a position from row and column (0-3 each).
    ///
    /// Callers with unchecked input should use [`Pos::try_from_row_col`].
    #[inline]
    pub fn from_row_col(row: u8, col: u8) -> Pos {
        debug_assert!(row < BOARD_SIZE && col < BOARD_SIZE);
        Pos(row * BOARD_SIZE + col)
    }

    /// Checked constructor. Off-board coordinates are rejected, never clamped.
    pub fn try_from_row_col(row: u8, col: u8) -> Result<Pos, EngineError> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            Ok(Pos::from_row_col(row, col))
        } else {
            Err(EngineError::OutOfBounds {
                row: row.into(),
                col: col.into(),
            })
        }
    }

    /// Get the row (0-3).
    #[inline]
    pub fn row(self) -> u8 {
        self.0 / BOARD_SIZE
    }

    /// Get the column (0-3).
    #[inline]
    pub fn col(self) -> u8 {
        self.0 % BOARD_SIZE
    }

    /// Check if this is a valid position (0-15).
    #[inline]
    pub fn is_valid(self) -> bool {
        (self.0 as usize) < CELL_COUNT
    }

    /// Iterate over all 16 positions in row-major order.
    pub fn all() -> impl Iterator<Item = Pos> {
        (0..CELL_COUNT as u8).map(Pos)
    }

    /// Grave color of this cell.
    #[inline]
    pub fn grave_color(self) -> GraveColor {
        grave_color(self.row(), self.col())
    }

    #[inline]
    const fn bit(self) -> u16 {
        1 << self.0
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row(), self.col())
    }
}

/// Parses `row,col`, optionally wrapped in parentheses: `1,2`, `(1, 2)`.
impl FromStr for Pos {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Pos, EngineError> {
        let malformed = || EngineError::MalformedCoord(s.to_string());
        let trimmed = s.trim();
        let inner = match trimmed.strip_prefix('(') {
            Some(rest) => rest.strip_suffix(')').ok_or_else(malformed)?,
            None => trimmed,
        };
        let (row, col) = inner.split_once(',').ok_or_else(malformed)?;
        let row: i64 = row.trim().parse().map_err(|_| malformed())?;
        let col: i64 = col.trim().parse().map_err(|_| malformed())?;

        let out_of_bounds = EngineError::OutOfBounds { row, col };
        let row = u8::try_from(row).map_err(|_| out_of_bounds.clone())?;
        let col = u8::try_from(col).map_err(|_| out_of_bounds)?;
        Pos::try_from_row_col(row, col)
    }
}

// ============================================================================
// POSITION SETS
// ============================================================================

/// A set of board positions packed into 16 bits.
///
/// Iteration is always row-major, so legal sets are deterministic for a
/// given board.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PosSet(pub u16);

impl PosSet {
    pub const EMPTY: PosSet = PosSet(0);
    pub const FULL: PosSet = PosSet(u16::MAX);

    #[inline]
    pub fn insert(&mut self, pos: Pos) {
        debug_assert!(pos.is_valid());
        self.0 |= pos.bit();
    }

    #[inline]
    pub fn contains(self, pos: Pos) -> bool {
        pos.is_valid() && self.0 & pos.bit() != 0
    }

    #[inline]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn union(self, other: PosSet) -> PosSet {
        PosSet(self.0 | other.0)
    }

    #[inline]
    pub fn intersection(self, other: PosSet) -> PosSet {
        PosSet(self.0 & other.0)
    }

    /// Iterate over members in row-major order.
    pub fn iter(self) -> impl Iterator<Item = Pos> {
        Pos::all().filter(move |&pos| self.0 & pos.bit() != 0)
    }

    /// Get the member at `idx` in row-major order.
    pub fn nth(self, idx: usize) -> Option<Pos> {
        self.iter().nth(idx)
    }

    pub fn to_vec(self) -> Vec<Pos> {
        self.iter().collect()
    }
}

impl FromIterator<Pos> for PosSet {
    fn from_iter<I: IntoIterator<Item = Pos>>(iter: I) -> PosSet {
        let mut set = PosSet::EMPTY;
        for pos in iter {
            set.insert(pos);
        }
        set
    }
}

impl fmt::Debug for PosSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|p| (p.row(), p.col()))).finish()
    }
}

// ============================================================================
// GRAVES & DIE FACES
// ============================================================================

/// Color of the grave printed under a cell.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum GraveColor {
    Light,
    Dark,
    /// Not in either fixed set. Only reachable for off-board coordinates.
    Any,
}

/// Light graves: the top-left and bottom-right quadrants.
pub const LIGHT_GRAVES: PosSet = PosSet(0b1100_1100_0011_0011);
/// Dark graves: the top-right and bottom-left quadrants.
pub const DARK_GRAVES: PosSet = PosSet(0b0011_0011_1100_1100);

/// Grave color at a coordinate. Fixed for the life of the program.
pub fn grave_color(row: u8, col: u8) -> GraveColor {
    let Ok(pos) = Pos::try_from_row_col(row, col) else {
        return GraveColor::Any;
    };
    if LIGHT_GRAVES.contains(pos) {
        GraveColor::Light
    } else if DARK_GRAVES.contains(pos) {
        GraveColor::Dark
    } else {
        GraveColor::Any
    }
}

/// Outcome of a die roll.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum DieFace {
    LightGrave,
    DarkGrave,
    AnyGrave,
    SkeletonMove,
    GraveyardShift,
}

impl DieFace {
    /// All faces in die order.
    pub const ALL: [DieFace; 5] = [
        DieFace::LightGrave,
        DieFace::DarkGrave,
        DieFace::AnyGrave,
        DieFace::SkeletonMove,
        DieFace::GraveyardShift,
    ];

    /// Convert from index (0-4) in die order.
    #[inline]
    pub fn from_index(idx: usize) -> Option<DieFace> {
        Self::ALL.get(idx).copied()
    }

    /// Faces that place a monster on a grave.
    #[inline]
    pub fn is_grave(self) -> bool {
        matches!(self, DieFace::LightGrave | DieFace::DarkGrave | DieFace::AnyGrave)
    }

    /// Grave color this face restricts placement to, if any.
    #[inline]
    pub fn required_color(self) -> Option<GraveColor> {
        match self {
            DieFace::LightGrave => Some(GraveColor::Light),
            DieFace::DarkGrave => Some(GraveColor::Dark),
            DieFace::AnyGrave | DieFace::SkeletonMove | DieFace::GraveyardShift => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DieFace::LightGrave => "Light Grave",
            DieFace::DarkGrave => "Dark Grave",
            DieFace::AnyGrave => "Any Grave",
            DieFace::SkeletonMove => "Skeleton Move",
            DieFace::GraveyardShift => "Graveyard Shift",
        }
    }
}

impl fmt::Display for DieFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DieFace {
    type Err = String;

    fn from_str(s: &str) -> Result<DieFace, String> {
        let wanted = s.trim();
        DieFace::ALL
            .into_iter()
            .find(|face| face.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown die face: {wanted}"))
    }
}

// ============================================================================
// BOARD
// ============================================================================

/// Compact grid state - fits in a single u32.
///
/// See module documentation for encoding details.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Board(pub u32);

impl Board {
    /// Bits per cell.
    const CELL_BITS: u32 = 2;
    /// Mask for a single cell (0b11).
    const CELL_MASK: u32 = 0b11;

    /// The 8 winning lines: 4 rows, then 4 columns. No diagonals.
    pub const WIN_LINES: [[Pos; 4]; 8] = [
        [Pos(0), Pos(1), Pos(2), Pos(3)],     // Row 0
        [Pos(4), Pos(5), Pos(6), Pos(7)],     // Row 1
        [Pos(8), Pos(9), Pos(10), Pos(11)],   // Row 2
        [Pos(12), Pos(13), Pos(14), Pos(15)], // Row 3
        [Pos(0), Pos(4), Pos(8), Pos(12)],    // Col 0
        [Pos(1), Pos(5), Pos(9), Pos(13)],    // Col 1
        [Pos(2), Pos(6), Pos(10), Pos(14)],   // Col 2
        [Pos(3), Pos(7), Pos(11), Pos(15)],   // Col 3
    ];

    /// Bitmasks for the winning lines, same order as `WIN_LINES`.
    const WIN_MASKS: [u16; 8] = [
        0x000F, // Row 0
        0x00F0, // Row 1
        0x0F00, // Row 2
        0xF000, // Row 3
        0x1111, // Col 0
        0x2222, // Col 1
        0x4444, // Col 2
        0x8888, // Col 3
    ];

    /// Create an empty grid.
    #[inline]
    pub fn new() -> Board {
        Board(0)
    }

    /// Get the cell at the given position.
    #[inline]
    pub fn cell(&self, pos: Pos) -> Cell {
        debug_assert!(pos.is_valid());
        Cell::from_bits(self.0 >> (pos.0 as u32 * Self::CELL_BITS))
    }

    /// Overwrite the cell at the given position.
    /// Does NOT validate - the rules live on `GameState`.
    #[inline]
    pub fn set_cell(&mut self, pos: Pos, cell: Cell) {
        debug_assert!(pos.is_valid());
        let shift = pos.0 as u32 * Self::CELL_BITS;
        self.0 = (self.0 & !(Self::CELL_MASK << shift)) | ((cell as u32) << shift);
    }

    /// Check if a cell is empty.
    #[inline]
    pub fn is_empty(&self, pos: Pos) -> bool {
        self.cell(pos) == Cell::Empty
    }

    /// Positions whose cell satisfies `pred`.
    fn cells_where(&self, pred: impl Fn(Cell) -> bool) -> PosSet {
        Pos::all().filter(|&pos| pred(self.cell(pos))).collect()
    }

    /// Positions holding exactly `cell`.
    pub fn cells_matching(&self, cell: Cell) -> PosSet {
        self.cells_where(|c| c == cell)
    }

    /// Number of skeletons placed on the grid.
    #[inline]
    pub fn skeletons_on_board(&self) -> u8 {
        self.cells_matching(Cell::Skeleton).len() as u8
    }

    /// Grid as rows of cells, for rendering.
    pub fn rows(&self) -> [[Cell; 4]; 4] {
        let mut rows = [[Cell::Empty; 4]; 4];
        for pos in Pos::all() {
            rows[pos.row() as usize][pos.col() as usize] = self.cell(pos);
        }
        rows
    }

    // ========== Legality ==========

    /// Cells a monster can go on for a grave face.
    ///
    /// A cell qualifies if it is empty or holds a skeleton and its grave
    /// matches the face's color (`AnyGrave` takes any color). Non-grave
    /// faces yield the empty set; see `GameState::legal_placements` for
    /// the full per-face dispatch.
    pub fn valid_placements(&self, face: DieFace) -> PosSet {
        if !face.is_grave() {
            return PosSet::EMPTY;
        }
        let candidates = self.cells_where(Cell::accepts_monster);
        let placements = match face.required_color() {
            Some(GraveColor::Light) => candidates.intersection(LIGHT_GRAVES),
            Some(GraveColor::Dark) => candidates.intersection(DARK_GRAVES),
            Some(GraveColor::Any) | None => candidates,
        };
        log::trace!("{face}: {} valid placements {placements:?}", placements.len());
        placements
    }

    /// Cells a skeleton can go on: exactly the empty ones.
    pub fn empty_placements(&self) -> PosSet {
        self.cells_matching(Cell::Empty)
    }

    // ========== Win Detection ==========

    /// Compute occupancy masks: (player one, player two, skeleton).
    /// Bit i is set if that piece occupies cell i.
    #[inline]
    pub fn occupancy_masks(&self) -> (u16, u16, u16) {
        let mut p1_mask = 0u16;
        let mut p2_mask = 0u16;
        let mut skel_mask = 0u16;

        for pos in Pos::all() {
            match self.cell(pos) {
                Cell::Player1 => p1_mask |= pos.bit(),
                Cell::Player2 => p2_mask |= pos.bit(),
                Cell::Skeleton => skel_mask |= pos.bit(),
                Cell::Empty => {}
            }
        }

        (p1_mask, p2_mask, skel_mask)
    }

    /// Get the winner and the first line they complete, if any.
    ///
    /// A line is won when it has no empty cell, holds at least one monster,
    /// and every non-skeleton cell belongs to the same player. Lines are
    /// checked rows first, then columns, and the first match decides; this
    /// is also the tie-break if both players somehow complete a line.
    pub fn winning_line(&self) -> Option<(Player, [Pos; 4])> {
        let (p1_mask, p2_mask, skel_mask) = self.occupancy_masks();

        for (line, &win_mask) in Self::WIN_LINES.iter().zip(&Self::WIN_MASKS) {
            for (player, mask) in [(Player::One, p1_mask), (Player::Two, p2_mask)] {
                if mask & win_mask != 0 && (mask | skel_mask) & win_mask == win_mask {
                    return Some((player, *line));
                }
            }
        }

        None
    }

    /// Check for a winner. Returns None while the game is undecided.
    #[inline]
    pub fn winner(&self) -> Option<Player> {
        self.winning_line().map(|(player, _)| player)
    }
}
