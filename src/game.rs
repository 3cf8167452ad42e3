//! Bridges the range/combo model (C1) and the action tree (C4) into the
//! per-player combo lists the CFR engine (C5) iterates over. Plays the same
//! bridging role as the teacher's `PostFlopGame`, generalized to the spec's
//! combo-id-indexed storage (spec §9) instead of the teacher's string-keyed
//! design.

use crate::action_tree::{Player, Tree};
use crate::card::{Board, Card};
use crate::error::SolveError;
use crate::range::{combos_conflict, Combo, Range};

/// The two players' materialized combo lists and the action tree they share.
pub struct Game {
    pub board: Board,
    pub combos: [Vec<Combo>; 2],
    pub tree: Tree,
}

impl Game {
    pub fn new(ranges: &[Range; 2], board: Board, tree: Tree) -> Result<Self, SolveError> {
        let oop = ranges[0].combos(&board);
        let ip = ranges[1].combos(&board);

        if oop.is_empty() {
            return Err(SolveError::EmptyRange("OOP range has no combos left after blocking".into()));
        }
        if ip.is_empty() {
            return Err(SolveError::EmptyRange("IP range has no combos left after blocking".into()));
        }

        Ok(Game { board, combos: [oop, ip], tree })
    }

    pub fn combos(&self, player: Player) -> &[Combo] {
        &self.combos[player.index()]
    }

    /// Every `(oop_index, ip_index)` pair whose combos don't share a card.
    pub fn non_conflicting_pairs(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for (i, oop) in self.combos[0].iter().enumerate() {
            for (j, ip) in self.combos[1].iter().enumerate() {
                if !combos_conflict(oop.cards, ip.cards) {
                    out.push((i, j));
                }
            }
        }
        out
    }

    pub fn full_board(&self, runout: &[Card]) -> Vec<Card> {
        let mut board = self.board.clone();
        board.extend_from_slice(runout);
        board
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_tree::{build_tree, TreeConfig};
    use crate::bet_size::BetSizeOptions;
    use crate::card::Street;

    // spec S3: OOP {AA:1}, board As Kc 2d -> exactly 3 combos remain.
    #[test]
    fn scenario_s3_blocked_range() {
        let oop: Range = "AA".parse().unwrap();
        let ip: Range = "KK".parse().unwrap();
        let board = crate::card::parse_cards("As Kc 2d").unwrap();
        let tree_config = TreeConfig {
            start_street: Street::Flop,
            initial_pot: 10.0,
            initial_stack: 100.0,
            bet_sizing: BetSizeOptions::default(),
            max_raises_per_street: 2,
        };
        let tree = build_tree(&tree_config).unwrap();
        let game = Game::new(&[oop, ip], board, tree).unwrap();
        assert_eq!(game.combos(Player::Oop).len(), 3);
    }

    #[test]
    fn empty_range_is_hard_error() {
        let oop: Range = "AA".parse().unwrap();
        let ip: Range = "AA".parse().unwrap();
        // no unblocked AA combos remain for IP once OOP's AA-on-board-less-board
        // combos are subtracted is not how ranges work; use a board that blocks everything instead
        let board = crate::card::parse_cards("As Ad Ah Ac 2d").unwrap();
        let tree_config = TreeConfig::default();
        let tree = build_tree(&tree_config).unwrap();
        let err = Game::new(&[oop, ip], board, tree);
        assert!(matches!(err, Err(SolveError::EmptyRange(_))));
    }
}
