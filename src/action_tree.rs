//! C4: the bounded, two-player, OOP-first postflop action-tree builder.
//!
//! Nodes live in a flat arena (`Tree::nodes`) and actions in a second flat
//! arena (`Tree::actions`), with each node pointing at a `[start, end)` span
//! of its own actions — the arena-of-`u32`-indices design called for in
//! spec §9, in place of the teacher's owning-pointer `ActionTree`.

use serde::{Deserialize, Serialize};

use crate::bet_size::{BetSize, BetSizeOptions};
use crate::card::Street;
use crate::error::SolveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    Oop,
    Ip,
}

impl Player {
    pub fn other(self) -> Player {
        match self {
            Player::Oop => Player::Ip,
            Player::Ip => Player::Oop,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Player::Oop => 0,
            Player::Ip => 1,
        }
    }
}

/// A tagged action variant (spec §9: avoids a hashmap lookup in the hot
/// loop). The `u8` payload of `Bet`/`Raise` indexes into the sizing options
/// that produced it; the actual chip amount lives on the [`ActionEntry`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Fold,
    Check,
    Call,
    Bet(u8),
    Raise(u8),
    AllIn,
}

/// The six-entry canonical action vocabulary used by strategy extraction
/// (spec §4.5): every `Bet(_)` collapses to `Bet`, every `Raise(_)` to `Raise`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalAction {
    Fold,
    Check,
    Call,
    Bet,
    Raise,
    AllIn,
}

pub const CANONICAL_ACTIONS: [CanonicalAction; 6] = [
    CanonicalAction::Fold,
    CanonicalAction::Check,
    CanonicalAction::Call,
    CanonicalAction::Bet,
    CanonicalAction::Raise,
    CanonicalAction::AllIn,
];

impl Action {
    pub fn canonical(self) -> CanonicalAction {
        match self {
            Action::Fold => CanonicalAction::Fold,
            Action::Check => CanonicalAction::Check,
            Action::Call => CanonicalAction::Call,
            Action::Bet(_) => CanonicalAction::Bet,
            Action::Raise(_) => CanonicalAction::Raise,
            Action::AllIn => CanonicalAction::AllIn,
        }
    }
}

pub struct ActionEntry {
    pub action: Action,
    /// Chips this action adds to the pot (`added_chips` in spec §3's
    /// child-consistency invariant).
    pub amount: f64,
    pub child: u32,
}

pub enum TerminalKind {
    Fold { winner: Player },
    Showdown,
}

pub enum NodeKind {
    Action { player: Player, street: Street, facing_bet: f64 },
    Terminal(TerminalKind),
}

pub struct GameNode {
    /// Stable string path from the root, suitable for use as a map key.
    pub id: String,
    pub kind: NodeKind,
    pub pot: f64,
    pub stack: f64,
    pub(crate) action_range: (u32, u32),
}

impl GameNode {
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, NodeKind::Terminal(_))
    }

    pub fn player(&self) -> Option<Player> {
        match self.kind {
            NodeKind::Action { player, .. } => Some(player),
            NodeKind::Terminal(_) => None,
        }
    }
}

pub struct Tree {
    pub nodes: Vec<GameNode>,
    pub actions: Vec<ActionEntry>,
}

impl Tree {
    pub fn root(&self) -> u32 {
        0
    }

    pub fn node(&self, idx: u32) -> &GameNode {
        &self.nodes[idx as usize]
    }

    pub fn actions_of(&self, idx: u32) -> &[ActionEntry] {
        let (start, end) = self.nodes[idx as usize].action_range;
        &self.actions[start as usize..end as usize]
    }
}

/// Configuration for [`build_tree`] (spec §4.4's `{start_street, initial_pot,
/// initial_stack, bet_sizing_policy}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    pub start_street: Street,
    pub initial_pot: f64,
    pub initial_stack: f64,
    pub bet_sizing: BetSizeOptions,
    /// Bound on raises per street so the tree stays finite (spec §3:
    /// "The tree is immutable after construction and tree-shaped"); not
    /// mandated by a specific number in the spec, see DESIGN.md.
    pub max_raises_per_street: u32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            start_street: Street::Flop,
            initial_pot: 1.0,
            initial_stack: 1.0,
            bet_sizing: BetSizeOptions::default(),
            max_raises_per_street: 4,
        }
    }
}

pub fn build_tree(config: &TreeConfig) -> Result<Tree, SolveError> {
    log::debug!(
        "building action tree: start_street={:?}, initial_pot={}, initial_stack={}, max_raises_per_street={}",
        config.start_street,
        config.initial_pot,
        config.initial_stack,
        config.max_raises_per_street
    );

    if config.initial_pot <= 0.0 {
        return Err(SolveError::InvalidConfig("initial_pot must be > 0".into()));
    }
    if config.initial_stack <= 0.0 {
        return Err(SolveError::InvalidConfig("initial_stack must be > 0".into()));
    }

    let mut builder = Builder {
        nodes: Vec::new(),
        actions: Vec::new(),
        policy: &config.bet_sizing,
        max_raises: config.max_raises_per_street,
    };

    builder.build_action(
        Player::Oop,
        config.start_street,
        config.initial_pot,
        config.initial_stack,
        0.0,
        false,
        0,
        false,
        "r".to_string(),
    );

    log::info!("action tree built: {} nodes, {} action entries", builder.nodes.len(), builder.actions.len());

    Ok(Tree { nodes: builder.nodes, actions: builder.actions })
}

struct Builder<'a> {
    nodes: Vec<GameNode>,
    actions: Vec<ActionEntry>,
    policy: &'a BetSizeOptions,
    max_raises: u32,
}

impl<'a> Builder<'a> {
    fn push_terminal(&mut self, kind: TerminalKind, pot: f64, stack: f64, id: String) -> u32 {
        let idx = self.nodes.len() as u32;
        self.nodes.push(GameNode {
            id,
            kind: NodeKind::Terminal(kind),
            pot,
            stack,
            action_range: (0, 0),
        });
        idx
    }

    /// Resolves a check-check or bet/raise-call closing sequence: advances
    /// to the next street, or to a showdown if this was the river.
    fn street_close(&mut self, street: Street, pot: f64, stack: f64, id: String) -> u32 {
        match street.next() {
            Some(next) => self.build_action(Player::Oop, next, pot, stack, 0.0, false, 0, false, id),
            None => self.push_terminal(TerminalKind::Showdown, pot, stack, id),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build_action(
        &mut self,
        player: Player,
        street: Street,
        pot: f64,
        stack: f64,
        facing_bet: f64,
        is_second_to_act: bool,
        raises_used: u32,
        facing_allin: bool,
        path: String,
    ) -> u32 {
        let node_idx = self.nodes.len() as u32;
        // reserve the slot; filled in once children (and thus action_range) are known
        self.nodes.push(GameNode {
            id: path.clone(),
            kind: NodeKind::Action { player, street, facing_bet },
            pot,
            stack,
            action_range: (0, 0),
        });

        let mut local: Vec<ActionEntry> = Vec::new();

        if facing_allin {
            let fold_child = self.push_terminal(
                TerminalKind::Fold { winner: player.other() },
                pot,
                stack,
                format!("{path}:f"),
            );
            local.push(ActionEntry { action: Action::Fold, amount: 0.0, child: fold_child });

            let call_child =
                self.push_terminal(TerminalKind::Showdown, pot + facing_bet, 0.0, format!("{path}:c"));
            local.push(ActionEntry { action: Action::Call, amount: facing_bet, child: call_child });
        } else if facing_bet > 0.0 {
            let fold_child = self.push_terminal(
                TerminalKind::Fold { winner: player.other() },
                pot,
                stack,
                format!("{path}:f"),
            );
            local.push(ActionEntry { action: Action::Fold, amount: 0.0, child: fold_child });

            if facing_bet <= stack {
                let child = self.street_close(street, pot + facing_bet, stack - facing_bet, format!("{path}:c"));
                local.push(ActionEntry { action: Action::Call, amount: facing_bet, child });
            }

            if raises_used < self.max_raises {
                for (i, raise) in self.policy.raises().iter().enumerate() {
                    let BetSize::PrevBetRelative(m) = *raise else { continue };
                    let amount = m * facing_bet;
                    if amount > 0.0 && amount <= stack {
                        let child = self.build_action(
                            player.other(),
                            street,
                            pot + amount,
                            stack - amount,
                            amount,
                            false,
                            raises_used + 1,
                            false,
                            format!("{path}:r{i}"),
                        );
                        local.push(ActionEntry { action: Action::Raise(i as u8), amount, child });
                    }
                }
            }

            if stack > facing_bet {
                let amount = stack;
                let child = self.build_action(
                    player.other(),
                    street,
                    pot + amount,
                    0.0,
                    amount,
                    false,
                    raises_used + 1,
                    true,
                    format!("{path}:allin"),
                );
                local.push(ActionEntry { action: Action::AllIn, amount, child });
            }
        } else {
            let check_child = if is_second_to_act {
                self.street_close(street, pot, stack, format!("{path}:x2"))
            } else {
                self.build_action(player.other(), street, pot, stack, 0.0, true, 0, false, format!("{path}:x"))
            };
            local.push(ActionEntry { action: Action::Check, amount: 0.0, child: check_child });

            for (i, bet) in self.policy.bets().iter().enumerate() {
                let BetSize::PotRelative(f) = *bet else { continue };
                let amount = (f * pot).min(stack);
                if amount > 0.0 {
                    let child = self.build_action(
                        player.other(),
                        street,
                        pot + amount,
                        stack - amount,
                        amount,
                        false,
                        0,
                        false,
                        format!("{path}:b{i}"),
                    );
                    local.push(ActionEntry { action: Action::Bet(i as u8), amount, child });
                }
            }

            if stack > 0.0 {
                let amount = stack;
                let child = self.build_action(
                    player.other(),
                    street,
                    pot + amount,
                    0.0,
                    amount,
                    false,
                    0,
                    true,
                    format!("{path}:allin"),
                );
                local.push(ActionEntry { action: Action::AllIn, amount, child });
            }
        }

        let start = self.actions.len() as u32;
        self.actions.extend(local);
        let end = self.actions.len() as u32;
        self.nodes[node_idx as usize].action_range = (start, end);

        node_idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tree() -> Tree {
        let config = TreeConfig {
            start_street: Street::River,
            initial_pot: 10.0,
            initial_stack: 100.0,
            bet_sizing: BetSizeOptions::default(),
            max_raises_per_street: 2,
        };
        build_tree(&config).unwrap()
    }

    #[test]
    fn root_is_oop_action_node() {
        let tree = small_tree();
        let root = tree.node(tree.root());
        assert_eq!(root.player(), Some(Player::Oop));
        assert!(!root.is_terminal());
    }

    // spec §8 property 6: well-formedness
    #[test]
    fn every_leaf_is_terminal_and_pot_consistent() {
        let tree = small_tree();
        fn walk(tree: &Tree, idx: u32, expected_pot: f64) {
            let node = tree.node(idx);
            assert!((node.pot - expected_pot).abs() < 1e-6, "pot mismatch at {}", node.id);
            if node.is_terminal() {
                return;
            }
            let entries: Vec<_> = tree.actions_of(idx).iter().collect();
            assert!(!entries.is_empty(), "action node {} has no actions", node.id);
            for entry in entries {
                walk(tree, entry.child, expected_pot + entry.amount);
            }
        }
        walk(&tree, tree.root(), 10.0);
    }

    #[test]
    fn fold_always_terminates_with_opposite_winner() {
        let tree = small_tree();
        fn walk(tree: &Tree, idx: u32) {
            let node = tree.node(idx);
            if node.is_terminal() {
                return;
            }
            let player = node.player().unwrap();
            for entry in tree.actions_of(idx) {
                if entry.action == Action::Fold {
                    let child = tree.node(entry.child);
                    match &child.kind {
                        NodeKind::Terminal(TerminalKind::Fold { winner }) => {
                            assert_eq!(*winner, player.other());
                        }
                        _ => panic!("fold must lead to a fold terminal"),
                    }
                }
                walk(tree, entry.child);
            }
        }
        walk(&tree, tree.root());
    }

    #[test]
    fn stacks_stay_non_negative() {
        let tree = small_tree();
        for node in &tree.nodes {
            assert!(node.stack >= -1e-9, "negative stack at {}", node.id);
        }
    }

    #[test]
    fn river_check_check_is_showdown() {
        let tree = small_tree();
        let root_check = tree.actions_of(tree.root())
            .iter()
            .find(|a| a.action == Action::Check)
            .unwrap();
        let ip_node = tree.node(root_check.child);
        let ip_check = tree.actions_of(root_check.child)
            .iter()
            .find(|a| a.action == Action::Check)
            .unwrap();
        let showdown = tree.node(ip_check.child);
        assert!(matches!(showdown.kind, NodeKind::Terminal(TerminalKind::Showdown)));
        assert_eq!(ip_node.player(), Some(Player::Ip));
    }

    #[test]
    fn flop_tree_advances_streets() {
        let config = TreeConfig {
            start_street: Street::Flop,
            initial_pot: 10.0,
            initial_stack: 20.0,
            bet_sizing: BetSizeOptions::default(),
            max_raises_per_street: 2,
        };
        let tree = build_tree(&config).unwrap();
        let root_check = tree.actions_of(tree.root())
            .iter()
            .find(|a| a.action == Action::Check)
            .unwrap();
        let ip_check = tree.actions_of(root_check.child)
            .iter()
            .find(|a| a.action == Action::Check)
            .unwrap();
        let turn_node = tree.node(ip_check.child);
        match turn_node.kind {
            NodeKind::Action { street, player, facing_bet } => {
                assert_eq!(street, Street::Turn);
                assert_eq!(player, Player::Oop);
                assert_eq!(facing_bet, 0.0);
            }
            _ => panic!("expected an action node on the turn"),
        }
    }
}
