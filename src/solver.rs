//! C5: the Discounted-CFR engine. Owns the regret/cumulative-strategy
//! tables and the traversal loop; the discount-coefficient shape is
//! grounded in the teacher's `solver.rs` `DiscountParams`, generalized to
//! spec §4.5's exact alpha/beta/gamma formulae (the teacher hard-codes its
//! own constants; this crate exposes them as the documented, tunable
//! `alpha`/`beta`/`gamma`).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::action_tree::{NodeKind, Player, TerminalKind, CANONICAL_ACTIONS};
use crate::card::{rank_of, suit_of, Card};
use crate::equity::{hand_vs_hand_equity, EquityCache};
use crate::error::SolveError;
use crate::game::Game;
use crate::sliceop::{inner_product, normalize_strategy, regret_matching};

/// Tunable solver parameters (spec §6's `solver` config block).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    pub max_iterations: u32,
    pub convergence_threshold: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub warmup_iterations: u32,
    pub warmup_sample_rate: f64,
    pub use_suit_isomorphism: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            max_iterations: 300,
            convergence_threshold: 0.01,
            alpha: 1.5,
            beta: 0.5,
            gamma: 2.0,
            warmup_iterations: 30,
            warmup_sample_rate: 0.3,
            use_suit_isomorphism: true,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<(), SolveError> {
        if self.max_iterations == 0 {
            return Err(SolveError::InvalidConfig("max_iterations must be > 0".into()));
        }
        if self.convergence_threshold < 0.0 {
            return Err(SolveError::InvalidConfig("convergence_threshold must be >= 0".into()));
        }
        if !(0.0..=1.0).contains(&self.warmup_sample_rate) {
            return Err(SolveError::InvalidConfig("warmup_sample_rate must be in [0, 1]".into()));
        }
        if self.alpha < 0.0 || self.beta < 0.0 || self.gamma < 0.0 {
            return Err(SolveError::InvalidConfig("alpha/beta/gamma must be >= 0".into()));
        }
        Ok(())
    }
}

struct DiscountParams {
    alpha_coef: f32,
    beta_coef: f32,
    gamma_coef: f32,
}

impl DiscountParams {
    fn new(t: u32, alpha: f64, beta: f64, gamma: f64) -> Self {
        let t = t as f64;
        let t_alpha = t.powf(alpha);
        DiscountParams {
            alpha_coef: (t_alpha / (1.0 + t_alpha)) as f32,
            beta_coef: beta as f32,
            gamma_coef: (t / (t + 1.0)).powf(gamma) as f32,
        }
    }
}

struct NodeTables {
    regrets: Vec<f32>,
    cum_strategy: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    Converged,
    MaxIterations,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub iteration: u32,
    pub max_iterations: u32,
    pub exploitability: f64,
    pub elapsed_ms: u64,
}

/// Per-node, per-combo average strategy over the canonical six-action
/// vocabulary (spec §4.5's strategy extraction).
pub struct NodeStrategy {
    pub player: Player,
    pub per_combo: Vec<[f32; 6]>,
}

pub struct SolverResult {
    pub iterations: u32,
    pub exploitability: f64,
    pub elapsed: Duration,
    pub strategies: HashMap<String, NodeStrategy>,
    pub status: SolveStatus,
}

/// Groups of suits that are interchangeable on `board` (spec §4.5's suit
/// isomorphism). `applicable` is false whenever the board holds 3+ cards of
/// one suit, since flush potential breaks the symmetry.
struct Isomorphism {
    equivalents: f64,
    applicable: bool,
}

fn compute_isomorphism(board: &[Card]) -> Isomorphism {
    let mut rank_multiset: [Vec<u8>; 4] = Default::default();
    for &c in board {
        rank_multiset[suit_of(c) as usize].push(rank_of(c));
    }
    for g in rank_multiset.iter_mut() {
        g.sort_unstable();
    }
    if rank_multiset.iter().any(|g| g.len() >= 3) {
        return Isomorphism { equivalents: 1.0, applicable: false };
    }

    let mut groups: Vec<Vec<u8>> = Vec::new();
    'outer: for suit in 0..4u8 {
        for group in groups.iter_mut() {
            if rank_multiset[group[0] as usize] == rank_multiset[suit as usize] {
                group.push(suit);
                continue 'outer;
            }
        }
        groups.push(vec![suit]);
    }

    let equivalents: f64 = groups.iter().map(|g| factorial(g.len())).product();
    Isomorphism { equivalents, applicable: true }
}

fn factorial(n: usize) -> f64 {
    (1..=n as u64).product::<u64>() as f64
}

/// Deterministic pseudo-random inclusion test for warm-up sampling: a pure
/// function of `(iteration, oop_index, ip_index)` so repeated solves (and
/// the monotone-exploitability property, spec §8 #8) are exactly reproducible.
fn warmup_included(t: u32, i: usize, j: usize, rate: f64) -> bool {
    let mut x = (t as u64).wrapping_mul(0x9E3779B97F4A7C15);
    x ^= (i as u64).wrapping_mul(0xBF58476D1CE4E5B9);
    x ^= (j as u64).wrapping_mul(0x94D049BB133111EB);
    x ^= x >> 33;
    x = x.wrapping_mul(0xFF51AFD7ED558CCD);
    x ^= x >> 33;
    let frac = (x % 1_000_003) as f64 / 1_000_003.0;
    frac < rate
}

fn allocate_tables(game: &Game) -> Vec<Option<NodeTables>> {
    game.tree
        .nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| match node.kind {
            NodeKind::Action { player, .. } => {
                let n_actions = game.tree.actions_of(idx as u32).len();
                let n_combos = game.combos(player).len();
                Some(NodeTables {
                    regrets: vec![0.0; n_actions * n_combos],
                    cum_strategy: vec![0.0; n_actions * n_combos],
                })
            }
            NodeKind::Terminal(_) => None,
        })
        .collect()
}

fn compute_exploitability(tables: &[Option<NodeTables>]) -> f64 {
    let mut sum = 0.0f64;
    let mut count = 0u64;
    for table in tables.iter().flatten() {
        for &r in &table.regrets {
            sum += r.abs() as f64;
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Payoff is the traverser's share of the pot, net of what the traverser
/// themselves put in along this path (the amount they'd get back anyway if
/// they won every chip is not "profit"). Without the netting, a shove that
/// always loses still looks as good as checking, since both `pot`-scaled
/// rewards land on whichever action merely inflates the pot; only charging
/// each action against what it cost the traverser makes folding correctly
/// dominate a zero-equity bluff.
fn terminal_payoff(
    kind: &TerminalKind,
    pot: f64,
    traverser: Player,
    game: &Game,
    oop_idx: usize,
    ip_idx: usize,
    cache: &EquityCache,
    oop_invested: f32,
    ip_invested: f32,
) -> f32 {
    let traverser_invested = if traverser == Player::Oop { oop_invested } else { ip_invested };
    let won = match kind {
        TerminalKind::Fold { winner } => {
            if *winner == traverser {
                pot as f32
            } else {
                0.0
            }
        }
        TerminalKind::Showdown => {
            let oop_hole = game.combos(Player::Oop)[oop_idx].cards;
            let ip_hole = game.combos(Player::Ip)[ip_idx].cards;
            let oop_equity = hand_vs_hand_equity(oop_hole, ip_hole, &game.board, cache);
            let traverser_equity = if traverser == Player::Oop { oop_equity } else { 1.0 - oop_equity };
            (pot * traverser_equity) as f32
        }
    };
    won - traverser_invested
}

#[allow(clippy::too_many_arguments)]
fn cfr_traverse(
    game: &Game,
    tables: &mut [Option<NodeTables>],
    node_idx: u32,
    traverser: Player,
    oop_idx: usize,
    ip_idx: usize,
    reach_oop: f32,
    reach_ip: f32,
    oop_invested: f32,
    ip_invested: f32,
    discount: &DiscountParams,
    cache: &EquityCache,
) -> f32 {
    let node = game.tree.node(node_idx);
    let (player, pot) = match &node.kind {
        NodeKind::Terminal(kind) => {
            return terminal_payoff(kind, node.pot, traverser, game, oop_idx, ip_idx, cache, oop_invested, ip_invested);
        }
        NodeKind::Action { player, .. } => (*player, node.pot),
    };
    let _ = pot;

    let acting_idx = if player == Player::Oop { oop_idx } else { ip_idx };
    let n_actions = game.tree.actions_of(node_idx).len();

    let mut sigma = vec![0f32; n_actions];
    {
        let table = tables[node_idx as usize].as_ref().unwrap();
        let start = acting_idx * n_actions;
        regret_matching(&mut sigma, &table.regrets[start..start + n_actions]);
    }

    let entries_len = n_actions;
    let mut util = vec![0f32; entries_len];
    for i in 0..entries_len {
        let entry = &game.tree.actions_of(node_idx)[i];
        let child = entry.child;
        let amount = entry.amount as f32;
        let (next_oop, next_ip) = if player == Player::Oop {
            (reach_oop * sigma[i], reach_ip)
        } else {
            (reach_oop, reach_ip * sigma[i])
        };
        let (next_oop_inv, next_ip_inv) = if player == Player::Oop {
            (oop_invested + amount, ip_invested)
        } else {
            (oop_invested, ip_invested + amount)
        };
        util[i] = cfr_traverse(
            game, tables, child, traverser, oop_idx, ip_idx, next_oop, next_ip, next_oop_inv, next_ip_inv, discount, cache,
        );
    }

    let v = inner_product(&sigma, &util);

    if player == traverser {
        let opp_reach = if traverser == Player::Oop { reach_ip } else { reach_oop };
        let table = tables[node_idx as usize].as_mut().unwrap();
        let start = acting_idx * n_actions;
        let regret_slice = &mut table.regrets[start..start + n_actions];
        for i in 0..n_actions {
            let updated = regret_slice[i] + (util[i] - v) * opp_reach;
            regret_slice[i] = if updated > 0.0 {
                updated * discount.alpha_coef
            } else {
                updated * discount.beta_coef
            };
        }
    }

    let own_reach = if player == Player::Oop { reach_oop } else { reach_ip };
    let table = tables[node_idx as usize].as_mut().unwrap();
    let start = acting_idx * n_actions;
    let cum_slice = &mut table.cum_strategy[start..start + n_actions];
    for i in 0..n_actions {
        cum_slice[i] = discount.gamma_coef * cum_slice[i] + own_reach * sigma[i];
    }

    v
}

fn extract_strategies(game: &Game, tables: &[Option<NodeTables>]) -> HashMap<String, NodeStrategy> {
    let mut out = HashMap::new();
    for (idx, node) in game.tree.nodes.iter().enumerate() {
        let NodeKind::Action { player, .. } = &node.kind else { continue };
        let player = *player;
        let table = tables[idx].as_ref().unwrap();
        let entries = game.tree.actions_of(idx as u32);
        let n_actions = entries.len();
        let n_combos = game.combos(player).len();

        let mut per_combo = Vec::with_capacity(n_combos);
        let mut avg = vec![0f32; n_actions];
        for combo_idx in 0..n_combos {
            let start = combo_idx * n_actions;
            normalize_strategy(&mut avg, &table.cum_strategy[start..start + n_actions]);

            let mut canonical = [0f32; 6];
            for (i, entry) in entries.iter().enumerate() {
                let bucket = CANONICAL_ACTIONS
                    .iter()
                    .position(|c| *c == entry.action.canonical())
                    .unwrap();
                canonical[bucket] += avg[i];
            }
            per_combo.push(canonical);
        }

        out.insert(node.id.clone(), NodeStrategy { player, per_combo });
    }
    out
}

/// Runs Discounted CFR over `game`'s tree to `config.max_iterations` or
/// until the mean-|regret| exploitability proxy reaches
/// `config.convergence_threshold` (spec §4.5).
///
/// `progress` is invoked no more than once per 25 iterations; `cancel`, if
/// set, is polled on the same 25-iteration boundary and causes the loop to
/// exit with [`SolveStatus::Cancelled`]. `yield_now`, if set, is invoked
/// every 50 iterations as the engine's sole cooperative suspension point
/// (spec §5); it is a no-op hook by default.
pub fn solve(
    game: &Game,
    config: &SolverConfig,
    mut progress: Option<&mut dyn FnMut(&Progress)>,
    cancel: Option<&AtomicBool>,
    yield_now: Option<&dyn Fn()>,
) -> Result<SolverResult, SolveError> {
    config.validate()?;

    let start = Instant::now();
    let iso = compute_isomorphism(&game.board);
    let mut tables = allocate_tables(game);
    let cache = EquityCache::new();
    let pairs = game.non_conflicting_pairs();

    let mut iteration = 0u32;
    let mut exploitability = compute_exploitability(&tables);
    let mut status = SolveStatus::MaxIterations;

    for t in 1..=config.max_iterations {
        iteration = t;
        let discount = DiscountParams::new(t, config.alpha, config.beta, config.gamma);
        let in_warmup = t <= config.warmup_iterations;
        let warmup_comp = if in_warmup { 1.0 / config.warmup_sample_rate } else { 1.0 };
        let iso_weight = if config.use_suit_isomorphism && iso.applicable { iso.equivalents } else { 1.0 };

        for &(oop_idx, ip_idx) in &pairs {
            if in_warmup && !warmup_included(t, oop_idx, ip_idx, config.warmup_sample_rate) {
                continue;
            }

            let oop_weight = game.combos(Player::Oop)[oop_idx].weight * warmup_comp * iso_weight;
            let ip_weight = game.combos(Player::Ip)[ip_idx].weight * warmup_comp * iso_weight;

            cfr_traverse(
                game,
                &mut tables,
                game.tree.root(),
                Player::Oop,
                oop_idx,
                ip_idx,
                oop_weight as f32,
                ip_weight as f32,
                0.0,
                0.0,
                &discount,
                &cache,
            );
            cfr_traverse(
                game,
                &mut tables,
                game.tree.root(),
                Player::Ip,
                oop_idx,
                ip_idx,
                oop_weight as f32,
                ip_weight as f32,
                0.0,
                0.0,
                &discount,
                &cache,
            );
        }

        if t % 25 == 0 {
            exploitability = compute_exploitability(&tables);
            log::debug!("iteration {t}/{}: exploitability = {exploitability:.6}", config.max_iterations);
            if let Some(sink) = progress.as_deref_mut() {
                sink(&Progress {
                    iteration: t,
                    max_iterations: config.max_iterations,
                    exploitability,
                    elapsed_ms: start.elapsed().as_millis() as u64,
                });
            }
            if exploitability <= config.convergence_threshold {
                status = SolveStatus::Converged;
                break;
            }
            if let Some(flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    log::info!("solve cancelled at iteration {t}");
                    status = SolveStatus::Cancelled;
                    break;
                }
            }
        }

        if t % 50 == 0 {
            if let Some(f) = yield_now {
                f();
            }
        }
    }

    let strategies = extract_strategies(game, &tables);
    Ok(SolverResult {
        iterations: iteration,
        exploitability,
        elapsed: start.elapsed(),
        strategies,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_tree::{build_tree, CanonicalAction, TreeConfig};
    use crate::bet_size::BetSizeOptions;
    use crate::card::Street;
    use crate::range::Range;

    fn build_game(oop: &str, ip: &str, board: &str, pot: f64, stack: f64) -> Game {
        let tree_config = TreeConfig {
            start_street: Street::Flop,
            initial_pot: pot,
            initial_stack: stack,
            bet_sizing: BetSizeOptions::default(),
            max_raises_per_street: 1,
        };
        let tree = build_tree(&tree_config).unwrap();
        let oop_range: Range = oop.parse().unwrap();
        let ip_range: Range = ip.parse().unwrap();
        let board = crate::card::parse_cards(board).unwrap();
        Game::new(&[oop_range, ip_range], board, tree).unwrap()
    }

    // spec §8 property 7: current/average strategy is a probability distribution
    #[test]
    fn strategy_simplex_law() {
        let game = build_game("72o", "AA", "As Kd 7c", 10.0, 100.0);
        let config = SolverConfig { max_iterations: 50, ..Default::default() };
        let result = solve(&game, &config, None, None, None).unwrap();
        for strat in result.strategies.values() {
            for combo in &strat.per_combo {
                let sum: f32 = combo.iter().sum();
                assert!((sum - 1.0).abs() < 1e-4, "sum was {sum}");
                assert!(combo.iter().all(|&x| x >= -1e-6));
            }
        }
    }

    // S1: trivial fold on dry board -- OOP's 72o should check, never shove.
    #[test]
    fn scenario_s1_trivial_fold() {
        let game = build_game("72o", "AA", "As Kd 7c", 10.0, 100.0);
        let config = SolverConfig { max_iterations: 150, ..Default::default() };
        let result = solve(&game, &config, None, None, None).unwrap();
        let root = result.strategies.get("r").unwrap();
        assert_eq!(root.player, Player::Oop);
        let check_bucket = CANONICAL_ACTIONS.iter().position(|c| *c == CanonicalAction::Check).unwrap();
        let allin_bucket = CANONICAL_ACTIONS.iter().position(|c| *c == CanonicalAction::AllIn).unwrap();
        for combo in &root.per_combo {
            assert!(combo[check_bucket] >= 0.9, "check prob was {}", combo[check_bucket]);
            assert!(combo[allin_bucket] < 1e-3);
        }
    }

    #[test]
    fn exploitability_is_non_negative_and_finite() {
        let game = build_game("72o", "AA", "As Kd 7c", 10.0, 100.0);
        let config = SolverConfig { max_iterations: 50, ..Default::default() };
        let result = solve(&game, &config, None, None, None).unwrap();
        assert!(result.exploitability >= 0.0);
        assert!(result.exploitability.is_finite());
    }

    // S4: cancellation mid-solve still returns a well-formed partial result.
    #[test]
    fn scenario_s4_cancellation() {
        let game = build_game("QQ+", "JJ+", "Td9d6h", 20.0, 20.0);
        let flag = AtomicBool::new(false);
        flag.store(true, Ordering::Relaxed);
        let config = SolverConfig { max_iterations: 500, ..Default::default() };
        let result = solve(&game, &config, None, Some(&flag), None).unwrap();
        assert_eq!(result.status, SolveStatus::Cancelled);
        assert!(result.iterations > 0);
        assert!(result.iterations <= 500);
        for strat in result.strategies.values() {
            for combo in &strat.per_combo {
                let sum: f32 = combo.iter().sum();
                assert!((sum - 1.0).abs() < 1e-4);
            }
        }
    }

    // S5: isomorphism on/off must agree within 1% TV distance.
    #[test]
    fn scenario_s5_isomorphism_equivalence() {
        let make = |iso: bool| {
            let tree_config = TreeConfig {
                start_street: Street::Flop,
                initial_pot: 10.0,
                initial_stack: 40.0,
                bet_sizing: BetSizeOptions::default(),
                max_raises_per_street: 1,
            };
            let tree = build_tree(&tree_config).unwrap();
            let oop: Range = "A2s-A5s".parse().unwrap();
            let ip: Range = "KQo".parse().unwrap();
            let board = crate::card::parse_cards("2s 5s 9c").unwrap();
            let game = Game::new(&[oop, ip], board, tree).unwrap();
            let config = SolverConfig { max_iterations: 100, use_suit_isomorphism: iso, ..Default::default() };
            solve(&game, &config, None, None, None).unwrap()
        };

        let with_iso = make(true);
        let without_iso = make(false);

        for (id, strat) in &with_iso.strategies {
            let other = without_iso.strategies.get(id).unwrap();
            for (a, b) in strat.per_combo.iter().zip(other.per_combo.iter()) {
                let tv: f32 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum::<f32>() / 2.0;
                assert!(tv <= 0.01, "node {id} TV distance {tv} exceeds 1%");
            }
        }
    }
}
