//! C2: the 5-to-7 card hand evaluator.
//!
//! Ranks any 5, 6, or 7 card hand to a totally-ordered [`HandValue`]. For 6 and
//! 7 card hands this takes the best of all 5-card subsets, per spec §4.2.

use crate::card::{rank_of, suit_of, Card};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum HandRank {
    HighCard,
    Pair,
    TwoPair,
    Trips,
    Straight,
    Flush,
    FullHouse,
    Quads,
    StraightFlush,
    RoyalFlush,
}

/// A totally-ordered hand value: primarily by [`HandRank`], then by an
/// opaque tie-break integer (spec §4.2). Two hands with equal rank and
/// tie-break compare equal (a tie).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandValue {
    pub rank: HandRank,
    pub tiebreak: u32,
}

#[inline]
fn encode(ranks: &[u8]) -> u32 {
    ranks.iter().fold(0u32, |acc, &r| acc * 13 + r as u32)
}

/// Classifies exactly 5 distinct cards.
pub fn classify5(cards: [Card; 5]) -> HandValue {
    let ranks: [u8; 5] = [
        rank_of(cards[0]),
        rank_of(cards[1]),
        rank_of(cards[2]),
        rank_of(cards[3]),
        rank_of(cards[4]),
    ];
    let is_flush = (1..5).all(|i| suit_of(cards[i]) == suit_of(cards[0]));

    let mut counts = [0u8; 13];
    for &r in &ranks {
        counts[r as usize] += 1;
    }

    let mut distinct: Vec<u8> = (0..13).filter(|&r| counts[r as usize] > 0).collect();
    distinct.sort_unstable_by(|a, b| b.cmp(a));

    let straight_high = if distinct.len() == 5 {
        if distinct[0] - distinct[4] == 4 {
            Some(distinct[0])
        } else if distinct == [12, 3, 2, 1, 0] {
            // wheel: A-2-3-4-5, ranked as a 5-high straight
            Some(3)
        } else {
            None
        }
    } else {
        None
    };

    if let (Some(high), true) = (straight_high, is_flush) {
        return if high == 12 {
            HandValue { rank: HandRank::RoyalFlush, tiebreak: 12 }
        } else {
            HandValue { rank: HandRank::StraightFlush, tiebreak: high as u32 }
        };
    }

    // group ranks by multiplicity, descending rank within each group
    let mut by_count: Vec<(u8, u8)> = (0..13)
        .filter(|&r| counts[r as usize] > 0)
        .map(|r| (counts[r as usize], r))
        .collect();
    by_count.sort_unstable_by(|a, b| b.cmp(a));

    match (by_count[0].0, by_count.get(1).map(|x| x.0).unwrap_or(0)) {
        (4, _) => {
            let quad = by_count[0].1;
            let kicker = by_count[1].1;
            HandValue { rank: HandRank::Quads, tiebreak: encode(&[quad, kicker]) }
        }
        (3, 2) => {
            let trip = by_count[0].1;
            let pair = by_count[1].1;
            HandValue { rank: HandRank::FullHouse, tiebreak: encode(&[trip, pair]) }
        }
        _ if is_flush => {
            HandValue { rank: HandRank::Flush, tiebreak: encode(&distinct) }
        }
        _ if straight_high.is_some() => {
            HandValue { rank: HandRank::Straight, tiebreak: straight_high.unwrap() as u32 }
        }
        (3, _) => {
            let trip = by_count[0].1;
            let kickers: Vec<u8> = by_count[1..].iter().map(|x| x.1).collect();
            let mut enc = vec![trip];
            enc.extend(kickers);
            HandValue { rank: HandRank::Trips, tiebreak: encode(&enc) }
        }
        (2, 2) => {
            let hi_pair = by_count[0].1.max(by_count[1].1);
            let lo_pair = by_count[0].1.min(by_count[1].1);
            let kicker = by_count[2].1;
            HandValue {
                rank: HandRank::TwoPair,
                tiebreak: encode(&[hi_pair, lo_pair, kicker]),
            }
        }
        (2, _) => {
            let pair = by_count[0].1;
            let kickers: Vec<u8> = by_count[1..].iter().map(|x| x.1).collect();
            let mut enc = vec![pair];
            enc.extend(kickers);
            HandValue { rank: HandRank::Pair, tiebreak: encode(&enc) }
        }
        _ => HandValue { rank: HandRank::HighCard, tiebreak: encode(&distinct) },
    }
}

/// Enumerates all 5-card subsets of `cards` (6 or 7 of them) and returns the max.
fn best_of(cards: &[Card]) -> HandValue {
    debug_assert!((5..=7).contains(&cards.len()));
    if cards.len() == 5 {
        return classify5([cards[0], cards[1], cards[2], cards[3], cards[4]]);
    }

    fn recurse(
        cards: &[Card],
        idx: &mut [usize; 5],
        depth: usize,
        start: usize,
        best: &mut Option<HandValue>,
    ) {
        if depth == 5 {
            let hand = [
                cards[idx[0]],
                cards[idx[1]],
                cards[idx[2]],
                cards[idx[3]],
                cards[idx[4]],
            ];
            let value = classify5(hand);
            if best.is_none_or(|v| value > v) {
                *best = Some(value);
            }
            return;
        }
        for i in start..cards.len() {
            idx[depth] = i;
            recurse(cards, idx, depth + 1, i + 1, best);
        }
    }

    let mut best = None;
    recurse(cards, &mut [0usize; 5], 0, 0, &mut best);
    best.unwrap()
}

/// Evaluates 5 to 7 cards, taking the best 5-card subset for 6-7 card hands.
pub fn evaluate(cards: &[Card]) -> HandValue {
    match cards.len() {
        5 => classify5([cards[0], cards[1], cards[2], cards[3], cards[4]]),
        6 | 7 => best_of(cards),
        n => panic!("evaluate() requires 5-7 cards, got {n}"),
    }
}

/// Compares two heads-up hole-card pairs on a 5-card board, returning A's
/// equity share (`1.0`, `0.5`, or `0.0`).
pub fn compare_heads_up(hole_a: (Card, Card), hole_b: (Card, Card), board: &[Card]) -> f64 {
    debug_assert_eq!(board.len(), 5);
    let mut hand_a = board.to_vec();
    hand_a.push(hole_a.0);
    hand_a.push(hole_a.1);
    let mut hand_b = board.to_vec();
    hand_b.push(hole_b.0);
    hand_b.push(hole_b.1);

    let va = evaluate(&hand_a);
    let vb = evaluate(&hand_b);
    match va.cmp(&vb) {
        std::cmp::Ordering::Greater => 1.0,
        std::cmp::Ordering::Less => 0.0,
        std::cmp::Ordering::Equal => 0.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{parse_card, parse_cards};

    fn ev(s: &str) -> HandValue {
        evaluate(&parse_cards(s).unwrap())
    }

    #[test]
    fn category_ordering() {
        assert!(ev("As Ks Qs Js Ts") > ev("9s 8s 7s 6s 5s")); // straight flush > flush-less straight
        assert!(ev("2s 2h 2d 2c 3h") > ev("As Ad Ac 5h 5d")); // quads > full house
        assert!(ev("As Ad Ac 5h 5d") > ev("Ah Ad As Kh Qd")); // full house > trips
        assert!(ev("Ah Ad As Kh Qd") > ev("2s 2h 3d 3c 4h")); // trips > two pair
    }

    #[test]
    fn trips_ordering_ignores_kickers() {
        // trips of r1 > r2 regardless of kickers
        let hi = ev("9s 9h 9d 2c 3h");
        let lo = ev("8s 8h 8d As Kh");
        assert!(hi > lo);
    }

    #[test]
    fn wheel_is_lowest_straight() {
        let wheel = ev("As 2h 3d 4c 5h");
        let six_high = ev("2s 3h 4d 5c 6h");
        assert_eq!(wheel.rank, HandRank::Straight);
        assert!(wheel < six_high);
    }

    #[test]
    fn royal_flush_beats_straight_flush() {
        let royal = ev("Ts Js Qs Ks As");
        let sf = ev("9h 8h 7h 6h 5h");
        assert_eq!(royal.rank, HandRank::RoyalFlush);
        assert_eq!(sf.rank, HandRank::StraightFlush);
        assert!(royal > sf);
    }

    #[test]
    fn seven_card_takes_best_five() {
        let seven = parse_cards("As Ks Qs Js Ts 2h 3h").unwrap();
        assert_eq!(evaluate(&seven).rank, HandRank::RoyalFlush);
    }

    #[test]
    fn compare_heads_up_tie() {
        let board = parse_cards("2s 3h 4d 5c 6h").unwrap();
        let a = (parse_card("As").unwrap(), parse_card("Ks").unwrap());
        let b = (parse_card("Ad").unwrap(), parse_card("Kd").unwrap());
        assert_eq!(compare_heads_up(a, b, &board), 0.5);
    }
}
