//! C1: the 169-notation range model — parsing, combo enumeration, and
//! board-blocker filtering.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::card::{card_to_bitmask, cards_to_bitmask, Card};
use crate::error::BadNotation;

const RANKS: [char; 13] = [
    '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K', 'A',
];

fn rank_index(c: char) -> Option<u8> {
    RANKS.iter().position(|&r| r == c.to_ascii_uppercase()).map(|i| i as u8)
}

/// One of the 169 canonical starting-hand labels: `RR` (pair), `R1R2s`
/// (suited), or `R1R2o` (offsuit), with `R1` ranking higher than `R2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Notation {
    pub high: u8,
    pub low: u8,
    pub suited: Option<bool>, // None for a pair, Some(true) suited, Some(false) offsuit
}

impl Notation {
    pub fn is_pair(&self) -> bool {
        self.suited.is_none()
    }
}

impl fmt::Display for Notation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hi = RANKS[self.high as usize];
        let lo = RANKS[self.low as usize];
        match self.suited {
            None => write!(f, "{hi}{lo}"),
            Some(true) => write!(f, "{hi}{lo}s"),
            Some(false) => write!(f, "{hi}{lo}o"),
        }
    }
}

impl FromStr for Notation {
    type Err = BadNotation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() < 2 || chars.len() > 3 {
            return Err(BadNotation::Malformed(s.to_string()));
        }
        let r1 = rank_index(chars[0]).ok_or(BadNotation::BadRank(chars[0]))?;
        let r2 = rank_index(chars[1]).ok_or(BadNotation::BadRank(chars[1]))?;

        if chars.len() == 2 {
            if r1 != r2 {
                return Err(BadNotation::Malformed(s.to_string()));
            }
            return Ok(Notation { high: r1, low: r2, suited: None });
        }

        let suffix = chars[2].to_ascii_lowercase();
        if r1 == r2 {
            return Err(BadNotation::BadPair(s.to_string()));
        }
        let (high, low) = if r1 > r2 { (r1, r2) } else { (r2, r1) };
        match suffix {
            's' => Ok(Notation { high, low, suited: Some(true) }),
            'o' => Ok(Notation { high, low, suited: Some(false) }),
            _ => Err(BadNotation::Malformed(s.to_string())),
        }
    }
}

/// Index of a [`Notation`] in the canonical 169-entry table, row-major by
/// (high rank descending, low rank descending), pairs on the diagonal,
/// suited above it, offsuit below it — mirroring the conventional 13x13
/// grid, though that layout is strictly presentational (spec §3).
pub fn all_notations() -> Vec<Notation> {
    let mut out = Vec::with_capacity(169);
    for hi in (0..13u8).rev() {
        out.push(Notation { high: hi, low: hi, suited: None });
        for lo in (0..hi).rev() {
            out.push(Notation { high: hi, low: lo, suited: Some(true) });
            out.push(Notation { high: hi, low: lo, suited: Some(false) });
        }
    }
    out
}

/// A specific ordered pair of distinct cards realizing some [`Notation`],
/// carrying the parent notation's weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Combo {
    pub cards: (Card, Card),
    pub notation: Notation,
    pub weight: f64,
}

impl Combo {
    pub fn bitmask(&self) -> u64 {
        card_to_bitmask(self.cards.0) | card_to_bitmask(self.cards.1)
    }
}

/// True iff the two combos share a card.
pub fn combos_conflict(a: (Card, Card), b: (Card, Card)) -> bool {
    let ma = card_to_bitmask(a.0) | card_to_bitmask(a.1);
    let mb = card_to_bitmask(b.0) | card_to_bitmask(b.1);
    ma & mb != 0
}

/// Enumerates the 6/4/12 combos of `notation`, dropping any that intersect
/// `blocked_mask`. Ordering is deterministic: by suit-pair index for pairs,
/// by suit for suited, by `(suit1, suit2)` with `suit1 != suit2` for offsuit.
pub fn hand_combos(notation: Notation, blocked_mask: u64) -> Vec<(Card, Card)> {
    let mut out = Vec::new();
    let card_of = |rank: u8, suit: u8| rank * 4 + suit;

    if notation.is_pair() {
        for s1 in 0..4u8 {
            for s2 in (s1 + 1)..4u8 {
                let pair = (card_of(notation.high, s1), card_of(notation.high, s2));
                push_if_unblocked(&mut out, pair, blocked_mask);
            }
        }
    } else if notation.suited == Some(true) {
        for s in 0..4u8 {
            let pair = (card_of(notation.high, s), card_of(notation.low, s));
            push_if_unblocked(&mut out, pair, blocked_mask);
        }
    } else {
        for s1 in 0..4u8 {
            for s2 in 0..4u8 {
                if s1 == s2 {
                    continue;
                }
                let pair = (card_of(notation.high, s1), card_of(notation.low, s2));
                push_if_unblocked(&mut out, pair, blocked_mask);
            }
        }
    }
    out
}

#[inline]
fn push_if_unblocked(out: &mut Vec<(Card, Card)>, pair: (Card, Card), blocked_mask: u64) {
    let mask = card_to_bitmask(pair.0) | card_to_bitmask(pair.1);
    if mask & blocked_mask == 0 {
        out.push(pair);
    }
}

/// A mapping from each of the 169 notations to a weight in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Range {
    weights: Vec<f64>, // indexed by all_notations() order
}

impl Default for Range {
    fn default() -> Self {
        Range { weights: vec![0.0; 169] }
    }
}

fn notation_index(n: Notation) -> usize {
    all_notations().iter().position(|&x| x == n).unwrap()
}

impl Range {
    pub fn weight(&self, notation: Notation) -> f64 {
        self.weights[notation_index(notation)]
    }

    pub fn set_weight(&mut self, notation: Notation, weight: f64) {
        self.weights[notation_index(notation)] = weight.clamp(0.0, 1.0);
    }

    /// The combo set of this range on a given board: the board-filtered
    /// combos of every notation with nonzero weight, each carrying the
    /// notation's weight.
    pub fn combos(&self, board: &[Card]) -> Vec<Combo> {
        let blocked = cards_to_bitmask(board);
        let mut out = Vec::new();
        for (notation, &weight) in all_notations().iter().zip(self.weights.iter()) {
            if weight <= 0.0 {
                continue;
            }
            for cards in hand_combos(*notation, blocked) {
                out.push(Combo { cards, notation: *notation, weight });
            }
        }
        out
    }
}

static ITEM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<body>[2-9TJQKAso]{2,3})(?:-(?P<to>[2-9TJQKAso]{2,3}))?(?P<plus>\+)?(?::(?P<weight>[0-9.]+))?$")
        .unwrap()
});

/// Parses the comma-separated range grammar from spec §6:
/// `"AA,KK,AKs,AQo:0.5,66-22"`. Unknown notations are ignored; `+` expands a
/// notation upward to the pair/connector above it (e.g. `66+` = `66,77,...,AA`);
/// a `lo-hi` pair expands the inclusive span; `:weight` suffixes clamp to
/// `[0, 1]` and default to `1.0`.
impl FromStr for Range {
    type Err = BadNotation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut range = Range::default();
        for item in s.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            apply_item(&mut range, item)?;
        }
        Ok(range)
    }
}

fn apply_item(range: &mut Range, item: &str) -> Result<(), BadNotation> {
    let caps = match ITEM_RE.captures(item) {
        Some(c) => c,
        None => return Ok(()), // unknown notation: ignored per spec
    };
    let body = caps.name("body").unwrap().as_str();
    let weight: f64 = caps
        .name("weight")
        .map(|m| m.as_str().parse().unwrap_or(1.0))
        .unwrap_or(1.0);
    let weight = weight.clamp(0.0, 1.0);

    let base: Notation = match body.parse() {
        Ok(n) => n,
        Err(_) => return Ok(()),
    };

    if let Some(to) = caps.name("to") {
        let to: Notation = match to.as_str().parse() {
            Ok(n) => n,
            Err(_) => return Ok(()),
        };
        for n in span(base, to) {
            range.set_weight(n, weight);
        }
    } else if caps.name("plus").is_some() {
        for n in plus(base) {
            range.set_weight(n, weight);
        }
    } else {
        range.set_weight(base, weight);
    }
    Ok(())
}

/// `base+`: every notation of the same shape from `base` up to the top
/// (`AA` for pairs, `AKs`/`AKo` for suited/offsuit with a fixed high card).
fn plus(base: Notation) -> Vec<Notation> {
    if base.is_pair() {
        (base.high..13).map(|r| Notation { high: r, low: r, suited: None }).collect()
    } else {
        (base.low..base.high)
            .map(|lo| Notation { high: base.high, low: lo, suited: base.suited })
            .collect()
    }
}

/// `lo-hi`: the inclusive span between two notations of the same shape.
fn span(lo: Notation, hi: Notation) -> Vec<Notation> {
    if lo.is_pair() && hi.is_pair() {
        let (a, b) = (lo.high.min(hi.high), lo.high.max(hi.high));
        (a..=b).map(|r| Notation { high: r, low: r, suited: None }).collect()
    } else if lo.suited == hi.suited && lo.high == hi.high {
        let (a, b) = (lo.low.min(hi.low), lo.low.max(hi.low));
        (a..=b)
            .map(|l| Notation { high: lo.high, low: l, suited: lo.suited })
            .collect()
    } else {
        vec![lo, hi]
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        for (notation, &weight) in all_notations().iter().zip(self.weights.iter()) {
            if weight <= 0.0 {
                continue;
            }
            if (weight - 1.0).abs() < 1e-9 {
                parts.push(format!("{notation}"));
            } else {
                parts.push(format!("{notation}:{weight}"));
            }
        }
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combo_counts_empty_board() {
        assert_eq!(hand_combos("AA".parse().unwrap(), 0).len(), 6);
        assert_eq!(hand_combos("AKs".parse().unwrap(), 0).len(), 4);
        assert_eq!(hand_combos("AKo".parse().unwrap(), 0).len(), 12);
    }

    #[test]
    fn blocker_monotonically_reduces_combos() {
        let ace_mask = card_to_bitmask(crate::card::parse_card("As").unwrap());
        let unblocked = hand_combos("AA".parse().unwrap(), 0).len();
        let blocked = hand_combos("AA".parse().unwrap(), ace_mask).len();
        assert!(blocked < unblocked);
    }

    #[test]
    fn notation_parse_rejects_bad_pair() {
        assert!("AKp".parse::<Notation>().is_err());
        assert!("AAz".parse::<Notation>().is_err());
    }

    #[test]
    fn parse_range_scenario_s6() {
        let range: Range = "AA,KK,QQ:0.5,AKs,JTs,A2s-A5s".parse().unwrap();
        assert_eq!(range.weight("AA".parse().unwrap()), 1.0);
        assert_eq!(range.weight("KK".parse().unwrap()), 1.0);
        assert_eq!(range.weight("QQ".parse().unwrap()), 0.5);
        assert_eq!(range.weight("AKs".parse().unwrap()), 1.0);
        assert_eq!(range.weight("JTs".parse().unwrap()), 1.0);
        for lo in 0..4u8 {
            let n = Notation { high: 12, low: lo, suited: Some(true) };
            assert_eq!(range.weight(n), 1.0, "{n} should be included by A2s-A5s");
        }
        assert_eq!(range.weight("72o".parse().unwrap()), 0.0);
    }

    #[test]
    fn range_string_round_trip() {
        let s = "AA,KK:0.5";
        let range: Range = s.parse().unwrap();
        let printed = range.to_string();
        let reparsed: Range = printed.parse().unwrap();
        assert_eq!(range, reparsed);
    }

    #[test]
    fn plus_expansion() {
        let range: Range = "66+".parse().unwrap();
        assert_eq!(range.weight("66".parse().unwrap()), 1.0);
        assert_eq!(range.weight("AA".parse().unwrap()), 1.0);
        assert_eq!(range.weight("55".parse().unwrap()), 0.0);
    }
}
