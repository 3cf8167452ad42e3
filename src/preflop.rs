//! Preflop solver: a single-street specialization of the postflop engine
//! (spec.md §9: "the same CFR engine on a smaller tree ... with equity
//! supplied by the same kernel," no separate hand-strength heuristic).
//!
//! `action_tree::build_tree` always advances through postflop streets once a
//! round closes, which preflop never does, so this module builds its own
//! one-street tree in the same arena shape and hands it to the unmodified
//! `solver::solve`.

use serde::{Deserialize, Serialize};

use crate::action_tree::{Action, ActionEntry, GameNode, NodeKind, Player, TerminalKind, Tree};
use crate::bet_size::{BetSize, BetSizeOptions};
use crate::card::Street;
use crate::error::SolveError;
use crate::game::Game;
use crate::range::Range;

/// Configuration for [`build_preflop_tree`]. Blinds are folded into
/// `initial_pot`/`facing_bet` by the caller, the same way `action_tree`
/// folds antes into `initial_pot`: `facing_bet` is the chips the first actor
/// (button/SB in heads-up) still owes to complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreflopConfig {
    pub initial_pot: f64,
    pub initial_stack: f64,
    pub facing_bet: f64,
    pub sizing: BetSizeOptions,
    pub max_raises: u32,
}

impl Default for PreflopConfig {
    /// Heads-up, 100bb effective, button/SB (0.5bb posted) facing the 1bb
    /// big blind, opens/3-bets/4-bets at {5x, 3x, 2.5x} the bet faced.
    fn default() -> Self {
        PreflopConfig {
            initial_pot: 1.5,
            initial_stack: 99.5,
            facing_bet: 0.5,
            sizing: BetSizeOptions::new(
                Vec::new(),
                vec![
                    BetSize::PrevBetRelative(5.0),
                    BetSize::PrevBetRelative(3.0),
                    BetSize::PrevBetRelative(2.5),
                ],
            ),
            max_raises: 3,
        }
    }
}

/// Builds a one-street preflop action tree: fold / call / raise (bounded by
/// `max_raises`) / all-in, exactly the shapes `action_tree`'s facing-a-bet
/// branch offers, but closing directly to showdown rather than advancing a
/// street.
pub fn build_preflop_tree(config: &PreflopConfig) -> Result<Tree, SolveError> {
    log::debug!(
        "building preflop tree: initial_pot={}, initial_stack={}, facing_bet={}, max_raises={}",
        config.initial_pot,
        config.initial_stack,
        config.facing_bet,
        config.max_raises
    );

    if config.initial_pot <= 0.0 {
        return Err(SolveError::InvalidConfig("initial_pot must be > 0".into()));
    }
    if config.initial_stack <= 0.0 {
        return Err(SolveError::InvalidConfig("initial_stack must be > 0".into()));
    }
    if config.facing_bet < 0.0 {
        return Err(SolveError::InvalidConfig("facing_bet must be >= 0".into()));
    }

    let mut builder = PreflopBuilder { nodes: Vec::new(), actions: Vec::new(), sizing: &config.sizing, max_raises: config.max_raises };
    builder.build_action(Player::Oop, config.initial_pot, config.initial_stack, config.facing_bet, 0, "r".to_string());

    log::info!("preflop tree built: {} nodes, {} action entries", builder.nodes.len(), builder.actions.len());

    Ok(Tree { nodes: builder.nodes, actions: builder.actions })
}

/// Convenience wrapper mirroring `Game::new` for the postflop path: a
/// preflop tree plus the two 169-notation ranges, combo'd on an empty board
/// (spec §4.6's board-less case; the equity kernel enumerates all five
/// unseen cards for the showdown terminal).
pub fn preflop_game(oop: &Range, ip: &Range, config: &PreflopConfig) -> Result<Game, SolveError> {
    let tree = build_preflop_tree(config)?;
    Game::new(&[oop.clone(), ip.clone()], Vec::new(), tree)
}

struct PreflopBuilder<'a> {
    nodes: Vec<GameNode>,
    actions: Vec<ActionEntry>,
    sizing: &'a BetSizeOptions,
    max_raises: u32,
}

impl<'a> PreflopBuilder<'a> {
    fn push_terminal(&mut self, kind: TerminalKind, pot: f64, stack: f64, id: String) -> u32 {
        let idx = self.nodes.len() as u32;
        self.nodes.push(GameNode { id, kind: NodeKind::Terminal(kind), pot, stack, action_range: (0, 0) });
        idx
    }

    /// Opponent's fold-or-call decision over an all-in; no further raising.
    /// `facing_bet` is the shove amount the responder still owes -- calling
    /// doubles it into the pot (spec.md §4.4: "call → showdown terminal with
    /// doubled all-in in the pot").
    fn allin_response(&mut self, player: Player, pot: f64, facing_bet: f64, path: String) -> u32 {
        let node_idx = self.nodes.len() as u32;
        self.nodes.push(GameNode {
            id: path.clone(),
            kind: NodeKind::Action { player, street: Street::Flop, facing_bet },
            pot,
            stack: 0.0,
            action_range: (0, 0),
        });

        let fold_child = self.push_terminal(TerminalKind::Fold { winner: player.other() }, pot, 0.0, format!("{path}:f"));
        let call_child =
            self.push_terminal(TerminalKind::Showdown, pot + facing_bet, 0.0, format!("{path}:c"));
        let local = vec![
            ActionEntry { action: Action::Fold, amount: 0.0, child: fold_child },
            ActionEntry { action: Action::Call, amount: facing_bet, child: call_child },
        ];

        let start = self.actions.len() as u32;
        self.actions.extend(local);
        let end = self.actions.len() as u32;
        self.nodes[node_idx as usize].action_range = (start, end);
        node_idx
    }

    fn build_action(&mut self, player: Player, pot: f64, stack: f64, facing_bet: f64, raises_used: u32, path: String) -> u32 {
        let node_idx = self.nodes.len() as u32;
        self.nodes.push(GameNode {
            id: path.clone(),
            kind: NodeKind::Action { player, street: Street::Flop, facing_bet },
            pot,
            stack,
            action_range: (0, 0),
        });

        let mut local = Vec::new();

        let fold_child = self.push_terminal(TerminalKind::Fold { winner: player.other() }, pot, stack, format!("{path}:f"));
        local.push(ActionEntry { action: Action::Fold, amount: 0.0, child: fold_child });

        if facing_bet <= stack {
            let call_child = self.push_terminal(TerminalKind::Showdown, pot + facing_bet, stack - facing_bet, format!("{path}:c"));
            local.push(ActionEntry { action: Action::Call, amount: facing_bet, child: call_child });
        }

        if raises_used < self.max_raises {
            for (i, raise) in self.sizing.raises().iter().enumerate() {
                let BetSize::PrevBetRelative(m) = *raise else { continue };
                let amount = m * facing_bet;
                if amount > facing_bet && amount <= stack {
                    let child = self.build_action(player.other(), pot + amount, stack - amount, amount, raises_used + 1, format!("{path}:r{i}"));
                    local.push(ActionEntry { action: Action::Raise(i as u8), amount, child });
                }
            }
        }

        if stack > facing_bet {
            let amount = stack;
            let child = self.allin_response(player.other(), pot + amount, amount, format!("{path}:allin"));
            local.push(ActionEntry { action: Action::AllIn, amount, child });
        }

        let start = self.actions.len() as u32;
        self.actions.extend(local);
        let end = self.actions.len() as u32;
        self.nodes[node_idx as usize].action_range = (start, end);
        node_idx
    }
}
