//! Heads-up no-limit hold'em Discounted-CFR solver core.
//!
//! Five components compose the engine: the card/combo model ([`card`],
//! [`range`]), hand evaluation ([`hand`]), the equity kernel ([`equity`]),
//! action-tree construction ([`action_tree`], [`bet_size`]), and the CFR
//! engine itself ([`solver`]). [`preflop`] reuses the same engine on a
//! simplified single-street tree. [`solve`] is the crate's single external
//! entry point.

pub mod action_tree;
pub mod bet_size;
pub mod card;
pub mod equity;
pub mod error;
pub mod game;
pub mod hand;
pub mod preflop;
pub mod range;
pub(crate) mod sliceop;
pub mod solver;
pub(crate) mod utility;

use std::sync::atomic::AtomicBool;

use serde::{Deserialize, Serialize};

use action_tree::{build_tree, TreeConfig};
use card::{Board, Street};
use error::SolveError;
use game::Game;
use range::Range;
use solver::{solve as run_solver, Progress, SolverConfig, SolverResult};

/// Top-level input to [`solve`]: the two ranges as range strings, the board
/// as a card string, and the tree/solver sub-configs (spec §6's `{stack,
/// pot, oop_range, ip_range, board, solver: {...}}`, folded into one
/// `serde_json`-round-trippable struct).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveConfig {
    pub oop_range: String,
    pub ip_range: String,
    pub board: String,
    pub tree: TreeConfig,
    pub solver: SolverConfig,
}

/// Parses and validates `config`, builds the action tree and combo lists,
/// then runs Discounted CFR to convergence or `max_iterations`.
///
/// Every validation (`solver` config bounds, board-length-vs-`start_street`
/// consistency, card/range parsing, non-empty post-blocking ranges) runs
/// before any CFR iteration; a malformed `config` never burns solve time.
pub fn solve(
    config: &SolveConfig,
    progress: Option<&mut dyn FnMut(&Progress)>,
    cancel: Option<&AtomicBool>,
) -> Result<SolverResult, SolveError> {
    config.solver.validate()?;

    let board: Board = card::parse_cards(&config.board)?;
    let expected_len = match config.tree.start_street {
        Street::Flop => 3,
        Street::Turn => 4,
        Street::River => 5,
    };
    if board.len() != expected_len {
        return Err(SolveError::BadBoard(format!(
            "board `{}` has {} card(s), but start_street expects {expected_len}",
            config.board,
            board.len()
        )));
    }
    if card::cards_to_bitmask(&board).count_ones() as usize != board.len() {
        return Err(SolveError::BadBoard(format!("board `{}` has duplicate cards", config.board)));
    }

    let oop: Range = config.oop_range.parse()?;
    let ip: Range = config.ip_range.parse()?;

    let tree = build_tree(&config.tree)?;
    let game = Game::new(&[oop, ip], board, tree)?;

    run_solver(&game, &config.solver, progress, cancel, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bet_size::BetSizeOptions;

    fn base_config() -> SolveConfig {
        SolveConfig {
            oop_range: "72o".to_string(),
            ip_range: "AA".to_string(),
            board: "As Kd 7c".to_string(),
            tree: TreeConfig {
                start_street: Street::Flop,
                initial_pot: 10.0,
                initial_stack: 40.0,
                bet_sizing: BetSizeOptions::default(),
                max_raises_per_street: 1,
            },
            solver: SolverConfig { max_iterations: 30, ..Default::default() },
        }
    }

    #[test]
    fn solves_without_iterating_on_bad_config() {
        let mut config = base_config();
        config.solver.max_iterations = 0;
        let err = solve(&config, None, None);
        assert!(matches!(err, Err(SolveError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_board_length_mismatched_with_street() {
        let mut config = base_config();
        config.board = "As Kd".to_string();
        let err = solve(&config, None, None);
        assert!(matches!(err, Err(SolveError::BadBoard(_))));
    }

    #[test]
    fn rejects_duplicate_board_cards() {
        let mut config = base_config();
        config.board = "As As Kd".to_string();
        let err = solve(&config, None, None);
        assert!(matches!(err, Err(SolveError::BadBoard(_))));
    }

    #[test]
    fn rejects_malformed_range_string() {
        let mut config = base_config();
        config.oop_range = "ZZ".to_string();
        // malformed notation tokens are silently ignored by Range::from_str,
        // so this becomes an empty range rather than a parse error
        let result = solve(&config, None, None);
        assert!(matches!(result, Err(SolveError::EmptyRange(_))));
    }

    #[test]
    fn end_to_end_smoke() {
        let config = base_config();
        let result = solve(&config, None, None).unwrap();
        assert!(result.iterations > 0);
        assert!(!result.strategies.is_empty());
    }
}
