//! Bet-sizing policy consumed by the action-tree builder (C4). Generalizes
//! the teacher's `BetSize`/`BetSizeOptions` grammar down to the two shapes
//! spec §4.4 actually calls for: pot-relative bets and previous-bet-relative
//! raises, plus an implicit all-in action.

use serde::{Deserialize, Serialize};

/// A single configured bet or raise size.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum BetSize {
    /// Bet size relative to the current pot (e.g. `0.75` for 75% pot).
    PotRelative(f64),
    /// Raise size relative to the bet being faced (e.g. `2.0` for a pot-size-doubling raise).
    PrevBetRelative(f64),
}

impl TryFrom<&str> for BetSize {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let s_lower = s.trim().to_lowercase();
        let err = || format!("invalid bet size: {s}");

        if let Some(prefix) = s_lower.strip_suffix('x') {
            let v: f64 = prefix.parse().map_err(|_| err())?;
            if v <= 1.0 {
                return Err(format!("raise multiplier must exceed 1.0: {s}"));
            }
            Ok(BetSize::PrevBetRelative(v))
        } else if let Some(prefix) = s_lower.strip_suffix('%') {
            let v: f64 = prefix.parse().map_err(|_| err())?;
            Ok(BetSize::PotRelative(v / 100.0))
        } else {
            Err(err())
        }
    }
}

impl From<BetSize> for String {
    fn from(bs: BetSize) -> Self {
        match bs {
            BetSize::PotRelative(x) => format!("{}%", 100.0 * x),
            BetSize::PrevBetRelative(x) => format!("{x}x"),
        }
    }
}

/// Bet-size options for a single street, split into sizes offered when
/// opening the betting (`bets`) and sizes offered when raising (`raises`).
/// The all-in action is always implicitly available per spec §4.4 and is
/// not represented here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetSizeOptions {
    bets: Vec<BetSize>,
    raises: Vec<BetSize>,
}

impl BetSizeOptions {
    pub fn new(bets: Vec<BetSize>, raises: Vec<BetSize>) -> Self {
        BetSizeOptions { bets, raises }
    }

    pub fn bets(&self) -> &[BetSize] {
        &self.bets
    }

    pub fn raises(&self) -> &[BetSize] {
        &self.raises
    }
}

/// The builder's default sizing policy (spec §4.4): pot fractions
/// `{0.33, 0.50, 0.75, 1.00}` for bets, multipliers `{2.0, 3.0}` for raises.
impl Default for BetSizeOptions {
    fn default() -> Self {
        BetSizeOptions {
            bets: vec![
                BetSize::PotRelative(0.33),
                BetSize::PotRelative(0.50),
                BetSize::PotRelative(0.75),
                BetSize::PotRelative(1.00),
            ],
            raises: vec![BetSize::PrevBetRelative(2.0), BetSize::PrevBetRelative(3.0)],
        }
    }
}

impl TryFrom<(&str, &str)> for BetSizeOptions {
    type Error = String;

    fn try_from((bets_str, raises_str): (&str, &str)) -> Result<Self, Self::Error> {
        Ok(BetSizeOptions {
            bets: parse_list(bets_str)?,
            raises: parse_list(raises_str)?,
        })
    }
}

fn parse_list(s: &str) -> Result<Vec<BetSize>, String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(BetSize::try_from)
        .collect()
}
