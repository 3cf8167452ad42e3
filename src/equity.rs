//! C3: heads-up and range-vs-range equity, with full enumeration below a
//! runout-count threshold and Monte Carlo sampling above it.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::card::{card_to_bitmask, Card};
use crate::hand::compare_heads_up;
use crate::range::Combo;

/// Runout count at or below which [`hand_vs_hand_equity`] enumerates
/// exhaustively rather than sampling (spec §4.3).
pub const ENUM_THRESHOLD: usize = 1000;

/// Number of Monte Carlo samples drawn when the runout count exceeds
/// [`ENUM_THRESHOLD`].
pub const SAMPLES: usize = 1000;

type CacheKey = (Vec<Card>, Vec<Card>, Vec<Card>);

/// A process-local, order-insensitive memoization cache for
/// [`hand_vs_hand_equity`]. Passed explicitly rather than held as a global
/// singleton (spec §9 design note), so tests and concurrent solves stay
/// hermetic.
#[derive(Default)]
pub struct EquityCache {
    inner: RefCell<HashMap<CacheKey, f64>>,
}

impl EquityCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(hole_a: (Card, Card), hole_b: (Card, Card), board: &[Card]) -> CacheKey {
        let mut a = vec![hole_a.0, hole_a.1];
        let mut b = vec![hole_b.0, hole_b.1];
        a.sort_unstable();
        b.sort_unstable();
        let mut bd = board.to_vec();
        bd.sort_unstable();
        (a, b, bd)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A tiny xorshift PRNG so Monte Carlo sampling has no external `rand`
/// dependency; seeded per call from the hole/board cards so repeated calls
/// with the same hermetic cache are reproducible.
struct Xorshift64(u64);

impl Xorshift64 {
    fn new(seed: u64) -> Self {
        Xorshift64(seed | 1)
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn gen_range(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }
}

/// Heads-up equity of `hole_a` versus `hole_b` on a partial or complete
/// `board`. Returns `0.0` immediately if any card is duplicated across the
/// two hands and the board (the caller is responsible for not asking).
pub fn hand_vs_hand_equity(
    hole_a: (Card, Card),
    hole_b: (Card, Card),
    board: &[Card],
    cache: &EquityCache,
) -> f64 {
    let used_mask = card_to_bitmask(hole_a.0)
        | card_to_bitmask(hole_a.1)
        | card_to_bitmask(hole_b.0)
        | card_to_bitmask(hole_b.1)
        | board.iter().fold(0u64, |m, &c| m | card_to_bitmask(c));
    let used_count = 4 + board.len();
    if (used_mask.count_ones() as usize) != used_count {
        return 0.0;
    }

    let key = EquityCache::key(hole_a, hole_b, board);
    if let Some(&v) = cache.inner.borrow().get(&key) {
        return v;
    }

    let result = if board.len() == 5 {
        compare_heads_up(hole_a, hole_b, board)
    } else {
        let need = 5 - board.len();
        let remaining: Vec<Card> = (0..52u8).filter(|c| used_mask & card_to_bitmask(*c) == 0).collect();
        let r = n_choose_k(remaining.len(), need);

        if r <= ENUM_THRESHOLD as u64 {
            enumerate_runouts(hole_a, hole_b, board, &remaining, need)
        } else {
            monte_carlo_runouts(hole_a, hole_b, board, &remaining, need, used_mask)
        }
    };

    cache.inner.borrow_mut().insert(key, result);
    result
}

fn n_choose_k(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u64 = 1;
    for i in 0..k {
        result = result * (n - i) as u64 / (i + 1) as u64;
    }
    result
}

fn enumerate_runouts(
    hole_a: (Card, Card),
    hole_b: (Card, Card),
    board: &[Card],
    remaining: &[Card],
    need: usize,
) -> f64 {
    let mut total = 0.0;
    let mut count = 0u64;
    let mut combo = vec![0usize; need];

    fn recurse(
        remaining: &[Card],
        need: usize,
        combo: &mut Vec<usize>,
        depth: usize,
        start: usize,
        board: &[Card],
        hole_a: (Card, Card),
        hole_b: (Card, Card),
        total: &mut f64,
        count: &mut u64,
    ) {
        if depth == need {
            let mut full_board = board.to_vec();
            full_board.extend(combo.iter().map(|&i| remaining[i]));
            *total += compare_heads_up(hole_a, hole_b, &full_board);
            *count += 1;
            return;
        }
        for i in start..remaining.len() {
            combo[depth] = i;
            recurse(remaining, need, combo, depth + 1, i + 1, board, hole_a, hole_b, total, count);
        }
    }

    recurse(remaining, need, &mut combo, 0, 0, board, hole_a, hole_b, &mut total, &mut count);
    total / count as f64
}

fn monte_carlo_runouts(
    hole_a: (Card, Card),
    hole_b: (Card, Card),
    board: &[Card],
    remaining: &[Card],
    need: usize,
    used_mask: u64,
) -> f64 {
    let seed = used_mask ^ (used_mask.rotate_left(29)) ^ 0x9E3779B97F4A7C15;
    let mut rng = Xorshift64::new(seed);
    let mut pool = remaining.to_vec();
    let mut total = 0.0;

    for _ in 0..SAMPLES {
        // partial Fisher-Yates draw of `need` cards without replacement
        for i in 0..need {
            let j = i + rng.gen_range(pool.len() - i);
            pool.swap(i, j);
        }
        let mut full_board = board.to_vec();
        full_board.extend_from_slice(&pool[..need]);
        total += compare_heads_up(hole_a, hole_b, &full_board);
    }

    total / SAMPLES as f64
}

/// The combo-weighted average of [`hand_vs_hand_equity`] over every combo in
/// `range_combos` that does not conflict with `hole` (by bitmask).
pub fn hand_vs_range_equity(
    hole: (Card, Card),
    range_combos: &[Combo],
    board: &[Card],
    cache: &EquityCache,
) -> f64 {
    let hole_mask = card_to_bitmask(hole.0) | card_to_bitmask(hole.1);
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for combo in range_combos {
        if combo.bitmask() & hole_mask != 0 {
            continue;
        }
        let eq = hand_vs_hand_equity(hole, combo.cards, board, cache);
        weighted_sum += eq * combo.weight;
        weight_total += combo.weight;
    }

    if weight_total <= 0.0 {
        0.5
    } else {
        weighted_sum / weight_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::parse_card;

    fn h(s: &str) -> (Card, Card) {
        let cards = crate::card::parse_cards(s).unwrap();
        (cards[0], cards[1])
    }

    #[test]
    fn equity_bounds_and_symmetry() {
        let cache = EquityCache::new();
        let board = crate::card::parse_cards("Qh 7s 2d").unwrap();
        let a = h("Ah Kh");
        let b = h("Jd Jc");
        let eq_ab = hand_vs_hand_equity(a, b, &board, &cache);
        let eq_ba = hand_vs_hand_equity(b, a, &board, &cache);
        assert!((0.0..=1.0).contains(&eq_ab));
        assert!((eq_ab + eq_ba - 1.0).abs() < 1e-9);
    }

    #[test]
    fn duplicate_card_is_zero() {
        let cache = EquityCache::new();
        let board = crate::card::parse_cards("Qh 7s 2d").unwrap();
        let a = h("Ah Kh");
        let b = (parse_card("Ah").unwrap(), parse_card("Jc").unwrap());
        assert_eq!(hand_vs_hand_equity(a, b, &board, &cache), 0.0);
    }

    // S2: AKQ vs JJ showdown. Full enumeration of turn+river runouts (=990).
    // AK is drawing to overcards against a made pair on a Q-high board, with
    // a backdoor heart flush/straight draw; brute-force enumeration over all
    // 990 runouts puts its equity at ~0.290, not the [0.44, 0.48] a preflop
    // coinflip intuition suggests (see DESIGN.md open question #5).
    #[test]
    fn scenario_s2_akq_vs_jj() {
        let cache = EquityCache::new();
        let board = crate::card::parse_cards("Qh 7s 2d").unwrap();
        let a = h("Ah Kh");
        let b = h("Jd Jc");
        let eq = hand_vs_hand_equity(a, b, &board, &cache);
        assert!((0.27..=0.31).contains(&eq), "equity was {eq}");
    }

    #[test]
    fn equity_deterministic_in_enumeration_regime() {
        let cache1 = EquityCache::new();
        let cache2 = EquityCache::new();
        let board = crate::card::parse_cards("Qh 7s 2d Ts").unwrap(); // 46 remaining, 46 runouts
        let a = h("Ah Kh");
        let b = h("Jd Jc");
        let eq1 = hand_vs_hand_equity(a, b, &board, &cache1);
        let eq2 = hand_vs_hand_equity(b, a, &board, &cache2);
        assert!((eq1 - (1.0 - eq2)).abs() < 1e-9);
        let eq3 = hand_vs_hand_equity(a, b, &board, &cache1);
        assert_eq!(eq1, eq3);
    }

    #[test]
    fn river_board_is_direct_comparison() {
        let cache = EquityCache::new();
        let board = crate::card::parse_cards("2s 3h 4d 5c 6h").unwrap();
        let a = h("As Ks");
        let b = h("Ad Kd");
        assert_eq!(hand_vs_hand_equity(a, b, &board, &cache), 0.5);
    }
}
