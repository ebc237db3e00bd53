//! Rules scenarios and randomized play.
//!
//! Drives the engine only through its public API, the way a UI or bot
//! would: roll a face, pick from the legal set, check the outcome.

use monster4_core::{
    grave_color, Board, Cell, DieFace, EngineError, GameState, GraveColor, Outcome, Player, Pos,
    PosSet, RollOutcome, TurnPhase, STARTING_SKELETONS,
};
use rand::prelude::*;

/// Skeletons in the reserve plus on the grid.
fn skeleton_total(state: &GameState) -> u8 {
    state.reserve() + state.skeletons_on_board()
}

#[test]
fn test_grave_colors_partition_board() {
    let mut light = PosSet::EMPTY;
    let mut dark = PosSet::EMPTY;
    for row in 0..4 {
        for col in 0..4 {
            let pos = Pos::from_row_col(row, col);
            match grave_color(row, col) {
                GraveColor::Light => light.insert(pos),
                GraveColor::Dark => dark.insert(pos),
                GraveColor::Any => panic!("({row},{col}) is unclassified"),
            }
        }
    }
    assert_eq!(light.len(), 8);
    assert_eq!(dark.len(), 8);
    assert!(light.intersection(dark).is_empty());
}

#[test]
fn test_grave_faces_cover_fresh_board() {
    let state = GameState::new();
    let light = state.valid_placements(DieFace::LightGrave);
    let dark = state.valid_placements(DieFace::DarkGrave);
    let any = state.valid_placements(DieFace::AnyGrave);

    assert_eq!(light.union(dark).union(any), PosSet::FULL);
    assert_eq!(any, PosSet::FULL);
}

#[test]
fn test_any_grave_matches_open_cells_regardless_of_color() {
    let mut state = GameState::new();
    state.place_monster(0, 0, Player::One).unwrap();
    state.place_monster(2, 0, Player::Two).unwrap();
    state.place_skeleton(3, 3).unwrap();

    let open: PosSet = Pos::all()
        .filter(|&pos| state.board().cell(pos).accepts_monster())
        .collect();
    assert_eq!(state.valid_placements(DieFace::AnyGrave), open);
    assert_eq!(open.len(), 14);
}

#[test]
fn test_skeleton_placement_conserves_total() {
    let mut state = GameState::new();
    for (row, col) in [(0, 0), (1, 1), (2, 2)] {
        let reserve = state.reserve();
        let on_board = state.skeletons_on_board();
        state.place_skeleton(row, col).unwrap();
        assert_eq!(state.reserve(), reserve - 1);
        assert_eq!(state.skeletons_on_board(), on_board + 1);
        assert_eq!(skeleton_total(&state), STARTING_SKELETONS);
    }
}

#[test]
fn test_illegal_placements_leave_state_unchanged() {
    let mut state = GameState::new();
    state.place_monster(1, 1, Player::Two).unwrap();
    state.place_skeleton(0, 0).unwrap();
    let before = state.clone();

    assert!(matches!(
        state.place_monster(1, 1, Player::One),
        Err(EngineError::IllegalPlacement { .. })
    ));
    assert!(matches!(
        state.place_skeleton(0, 0),
        Err(EngineError::IllegalPlacement { .. })
    ));
    assert!(matches!(
        state.place_skeleton(1, 1),
        Err(EngineError::IllegalPlacement { .. })
    ));
    assert_eq!(state, before);

    // Dark face, light grave
    state.roll(DieFace::DarkGrave).unwrap();
    let rolled = state.clone();
    assert_eq!(
        state.place_at(3, 3),
        Err(EngineError::IllegalPlacement { pos: Pos::from_row_col(3, 3) })
    );
    assert_eq!(state, rolled);
}

#[test]
fn test_place_skeleton_out_of_bounds() {
    let mut state = GameState::new();
    let before = state.clone();
    assert_eq!(state.place_skeleton(0, 4), Err(EngineError::OutOfBounds { row: 0, col: 4 }));
    assert_eq!(state.place_skeleton(9, 1), Err(EngineError::OutOfBounds { row: 9, col: 1 }));
    assert_eq!(state, before);
    assert_eq!(state.reserve(), STARTING_SKELETONS);
}

#[test]
fn test_skeleton_move_with_no_empty_cells() {
    // Full board, reserve untouched: monsters only, arranged so no line is won
    let mut board = Board::new();
    for pos in Pos::all() {
        let owner = if (pos.row() + pos.col()) % 2 == 0 { Player::One } else { Player::Two };
        board.set_cell(pos, Cell::from(owner));
    }
    let mut state = GameState::from_parts(board, STARTING_SKELETONS, Player::Two).unwrap();
    assert_eq!(state.outcome(), Outcome::InProgress);

    assert_eq!(
        state.roll(DieFace::SkeletonMove),
        Ok(RollOutcome::NoLegalMoves { face: DieFace::SkeletonMove })
    );
    let report = state.skip_turn().unwrap();
    assert_eq!(report.player, Player::Two);
    assert_eq!(state.reserve(), STARTING_SKELETONS);
}

#[test]
fn test_row_scenarios() {
    let cases = [
        ([Cell::Player1, Cell::Skeleton, Cell::Player1, Cell::Player1], Some(Player::One)),
        ([Cell::Player1, Cell::Skeleton, Cell::Player2, Cell::Player1], None),
        ([Cell::Skeleton; 4], None),
    ];
    for (cells, expected) in cases {
        let mut board = Board::new();
        for (col, cell) in cells.into_iter().enumerate() {
            board.set_cell(Pos::from_row_col(1, col as u8), cell);
        }
        assert_eq!(board.winner(), expected, "row {cells:?}");
    }
}

#[test]
fn test_skeleton_completes_row_for_player_one() {
    let mut state = GameState::new();
    state.place_monster(1, 1, Player::One).unwrap();
    state.place_monster(1, 2, Player::One).unwrap();
    state.place_monster(1, 3, Player::One).unwrap();
    state.place_skeleton(1, 0).unwrap();

    assert_eq!(state.reserve(), STARTING_SKELETONS - 1);
    assert_eq!(state.winner(), Some(Player::One));
    assert_eq!(state.outcome(), Outcome::Won(Player::One));
}

#[test]
fn test_fifth_skeleton_exhausts_reserve() {
    let mut state = GameState::new();
    let cells = [(0, 0), (0, 1), (0, 2), (0, 3), (1, 0)];

    for &(row, col) in &cells[..4] {
        state.place_skeleton(row, col).unwrap();
    }
    let (row, col) = cells[4];
    assert_eq!(state.place_skeleton(row, col), Err(EngineError::ReserveExhausted));

    assert_eq!(state.skeletons_on_board(), 4);
    assert_eq!(state.reserve(), 0);
    // A row of skeletons is nobody's win
    assert_eq!(state.winner(), None);
}

#[test]
fn test_advisor_suggestions_validated() {
    let mut state = GameState::new();
    let rolled = state.roll(DieFace::LightGrave).unwrap();
    let RollOutcome::AwaitingPlacement { legal, .. } = rolled else {
        panic!("light grave should wait for a placement");
    };

    // Replies an outside advisor might give
    for reply in ["the best move is 1,2", "(9, 9)", "(0, 3)"] {
        let rejected = reply.parse::<Pos>().and_then(|pos| state.place(pos));
        assert!(rejected.is_err(), "accepted {reply}");
        assert_eq!(state.phase(), TurnPhase::AwaitingPlacement(DieFace::LightGrave));
    }

    // Fall back to a member of the legal set
    let fallback = legal.nth(0).unwrap();
    let report = state.place(fallback).unwrap();
    assert_eq!(report.placed, Some(fallback));
}

#[test_log::test]
fn test_turns_alternate_only_on_completion() {
    let mut state = GameState::new();

    state.roll(DieFace::AnyGrave).unwrap();
    assert!(state.place_at(7, 0).is_err());
    assert_eq!(state.current_player(), Player::One);
    state.place_at(0, 0).unwrap();
    assert_eq!(state.current_player(), Player::Two);

    state.roll(DieFace::GraveyardShift).unwrap();
    assert_eq!(state.current_player(), Player::One);

    state.roll(DieFace::SkeletonMove).unwrap();
    assert!(state.place_at(0, 0).is_err());
    state.place_at(0, 1).unwrap();
    assert_eq!(state.current_player(), Player::Two);
}

#[test_log::test]
fn test_random_games_keep_invariants() {
    let mut rng = rand::rng();

    for _ in 0..200 {
        let first = if rng.random_bool(0.5) { Player::One } else { Player::Two };
        let mut state = GameState::starting_with(first);

        for _ in 0..60 {
            if state.outcome() != Outcome::InProgress {
                break;
            }
            let mover = state.current_player();
            let face = DieFace::ALL[rng.random_range(0..DieFace::ALL.len())];
            let reserve_before = state.reserve();

            match state.roll(face) {
                Ok(RollOutcome::TurnComplete(report)) => {
                    assert_eq!(report.face, DieFace::GraveyardShift);
                    assert_eq!(report.placed, None);
                }
                Ok(RollOutcome::AwaitingPlacement { legal, .. }) => {
                    assert_eq!(legal, state.legal_moves());
                    let pos = legal.nth(rng.random_range(0..legal.len())).unwrap();
                    let report = state.place(pos).unwrap();
                    assert_eq!(report.player, mover);

                    let expected = match face {
                        DieFace::SkeletonMove => {
                            assert_eq!(state.reserve(), reserve_before - 1);
                            Cell::Skeleton
                        }
                        _ => {
                            assert_eq!(state.reserve(), reserve_before);
                            Cell::from(mover)
                        }
                    };
                    assert_eq!(state.board().cell(pos), expected);
                }
                Ok(RollOutcome::NoLegalMoves { face: rolled }) => {
                    assert_eq!(rolled, face);
                    assert!(state.legal_moves().is_empty());
                    state.skip_turn().unwrap();
                }
                Err(err) => panic!("unexpected error {err}"),
            }

            assert_eq!(state.current_player(), mover.opponent());
            assert_eq!(state.phase(), TurnPhase::AwaitingRoll);
            assert!(skeleton_total(&state) <= STARTING_SKELETONS);
            assert!(state.reserve() <= reserve_before);
            let expected_outcome = match state.winner() {
                Some(player) => Outcome::Won(player),
                None => Outcome::InProgress,
            };
            assert_eq!(state.outcome(), expected_outcome);
        }
    }
}

#[test]
fn test_snapshot_json_shape() {
    let mut state = GameState::new();
    state.roll(DieFace::SkeletonMove).unwrap();
    state.place_at(2, 3).unwrap();

    let json = serde_json::to_value(state.snapshot()).unwrap();
    assert_eq!(json["reserve"], 3);
    assert_eq!(json["to_move"], "Two");
    assert_eq!(json["outcome"], "InProgress");
    assert_eq!(json["phase"], "AwaitingRoll");
    assert_eq!(json["cells"][2][3], "Skeleton");
    assert_eq!(json["cells"][0][0], "Empty");
    assert!(json["winning_line"].is_null());
}
