//! WASM bindings for monster4-core
//!
//! Provides a JavaScript-friendly API for the rules engine.

use wasm_bindgen::prelude::*;

use crate::{DieFace, EngineError, GameState, Outcome, Player, PosSet, RollOutcome, TurnPhase};

fn to_js(err: EngineError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Flatten a set into [row, col, row, col, ...]
fn flatten(set: PosSet) -> Vec<u8> {
    set.iter().flat_map(|pos| [pos.row(), pos.col()]).collect()
}

/// WASM-friendly wrapper around GameState
#[wasm_bindgen]
pub struct WasmGame {
    inner: GameState,
}

#[wasm_bindgen]
impl WasmGame {
    /// Start a new game. `first` is 1 or 2; anything else means player 1.
    #[wasm_bindgen(constructor)]
    pub fn new(first: u8) -> WasmGame {
        let first = Player::from_bits(first).unwrap_or(Player::One);
        WasmGame { inner: GameState::starting_with(first) }
    }

    /// Restore a game from `toJson` output
    #[wasm_bindgen(js_name = fromJson)]
    pub fn from_json(json: JsValue) -> Result<WasmGame, JsValue> {
        let inner: GameState = serde_wasm_bindgen::from_value(json)?;
        Ok(WasmGame { inner })
    }

    #[wasm_bindgen(js_name = toJson)]
    pub fn to_json(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.inner)?)
    }

    /// Current player (1 or 2)
    #[wasm_bindgen(js_name = currentPlayer)]
    pub fn current_player(&self) -> u8 {
        self.inner.current_player() as u8
    }

    /// Skeletons left in the reserve
    pub fn reserve(&self) -> u8 {
        self.inner.reserve()
    }

    /// Check for winner. Returns 0 (none), 1 (P1), or 2 (P2)
    pub fn winner(&self) -> u8 {
        match self.inner.outcome() {
            Outcome::InProgress => 0,
            Outcome::Won(player) => player as u8,
        }
    }

    /// Get winning line as [row, col, ...]. Empty if no winner.
    #[wasm_bindgen(js_name = winningLine)]
    pub fn winning_line(&self) -> Vec<u8> {
        match self.inner.winning_line() {
            Some((_, line)) => line.iter().flat_map(|pos| [pos.row(), pos.col()]).collect(),
            None => vec![],
        }
    }

    /// Roll a face by die index (0 = Light Grave ... 4 = Graveyard Shift).
    /// Returns the legal placements as [row, col, ...]; empty when the
    /// turn already ended or nothing can be placed (see `mustSkip`).
    /// Errors are thrown as strings.
    pub fn roll(&mut self, face: u8) -> Result<Vec<u8>, JsValue> {
        let face = DieFace::from_index(face as usize)
            .ok_or_else(|| JsValue::from_str("die face index must be 0-4"))?;
        match self.inner.roll(face).map_err(to_js)? {
            RollOutcome::AwaitingPlacement { legal, .. } => Ok(flatten(legal)),
            RollOutcome::TurnComplete(_) | RollOutcome::NoLegalMoves { .. } => Ok(vec![]),
        }
    }

    /// True when a face was rolled and nothing can be placed for it
    #[wasm_bindgen(js_name = mustSkip)]
    pub fn must_skip(&self) -> bool {
        matches!(self.inner.phase(), TurnPhase::AwaitingPlacement(_))
            && self.inner.legal_moves().is_empty()
    }

    /// Legal placements for the rolled face as [row, col, ...]
    #[wasm_bindgen(js_name = legalMoves)]
    pub fn legal_moves(&self) -> Vec<u8> {
        flatten(self.inner.legal_moves())
    }

    /// Place for the rolled face. Returns the turn report.
    pub fn place(&mut self, row: u8, col: u8) -> Result<JsValue, JsValue> {
        let report = self.inner.place_at(row, col).map_err(to_js)?;
        Ok(serde_wasm_bindgen::to_value(&report)?)
    }

    /// Forfeit a turn with no legal placements
    #[wasm_bindgen(js_name = skipTurn)]
    pub fn skip_turn(&mut self) -> Result<JsValue, JsValue> {
        let report = self.inner.skip_turn().map_err(to_js)?;
        Ok(serde_wasm_bindgen::to_value(&report)?)
    }

    /// Full rendering view: cells, reserve, player to move, outcome, phase
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.inner.snapshot())?)
    }

    /// Text rendering of the board
    pub fn render(&self) -> String {
        self.inner.to_string()
    }
}

impl Default for WasmGame {
    fn default() -> Self {
        Self::new(1)
    }
}
