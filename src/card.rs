//! C1: card encoding. A [`Card`] is a rank/suit pair packed into a `u8` id in
//! `[0, 52)`, matching the teacher's `card_id = 4 * rank + suit` convention.

use crate::error::BadCard;

/// A card, represented as an id in `[0, 52)`. `rank = card / 4`, `suit = card % 4`.
pub type Card = u8;

#[inline]
pub fn card_to_id(card: Card) -> u8 {
    card
}

#[inline]
pub fn id_to_card(id: u8) -> Card {
    id
}

#[inline]
pub fn rank_of(card: Card) -> u8 {
    card >> 2
}

#[inline]
pub fn suit_of(card: Card) -> u8 {
    card & 3
}

#[inline]
pub fn card_to_bitmask(card: Card) -> u64 {
    1u64 << card
}

#[inline]
pub fn cards_to_bitmask(cards: &[Card]) -> u64 {
    cards.iter().fold(0u64, |mask, &c| mask | card_to_bitmask(c))
}

fn check_card(card: Card) -> Result<(), BadCard> {
    if card < 52 {
        Ok(())
    } else {
        Err(BadCard::Malformed(format!("card id {card} out of range")))
    }
}

#[inline]
fn rank_to_char(rank: u8) -> Result<char, BadCard> {
    match rank {
        12 => Ok('A'),
        11 => Ok('K'),
        10 => Ok('Q'),
        9 => Ok('J'),
        8 => Ok('T'),
        0..=7 => Ok((rank + b'2') as char),
        _ => Err(BadCard::BadRank(rank as char)),
    }
}

#[inline]
fn char_to_rank(c: char) -> Result<u8, BadCard> {
    match c.to_ascii_uppercase() {
        'A' => Ok(12),
        'K' => Ok(11),
        'Q' => Ok(10),
        'J' => Ok(9),
        'T' => Ok(8),
        '2'..='9' => Ok(c as u8 - b'2'),
        other => Err(BadCard::BadRank(other)),
    }
}

#[inline]
fn suit_to_char(suit: u8) -> Result<char, BadCard> {
    match suit {
        0 => Ok('c'),
        1 => Ok('d'),
        2 => Ok('h'),
        3 => Ok('s'),
        _ => Err(BadCard::BadSuit(suit as char)),
    }
}

#[inline]
fn char_to_suit(c: char) -> Result<u8, BadCard> {
    match c.to_ascii_lowercase() {
        'c' => Ok(0),
        'd' => Ok(1),
        'h' => Ok(2),
        's' => Ok(3),
        other => Err(BadCard::BadSuit(other)),
    }
}

/// Parses a two-character, case-insensitive card string such as `"As"` or `"th"`.
///
/// # Examples
/// ```
/// use holdem_gto_core::card::*;
/// assert_eq!(parse_card("As").unwrap(), 51);
/// assert_eq!(parse_card("2c").unwrap(), 0);
/// assert!(parse_card("Xs").is_err());
/// ```
pub fn parse_card(s: &str) -> Result<Card, BadCard> {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() != 2 {
        return Err(BadCard::Malformed(s.to_string()));
    }
    let rank = char_to_rank(chars[0])?;
    let suit = char_to_suit(chars[1])?;
    Ok(rank * 4 + suit)
}

/// Inverse of [`parse_card`].
pub fn card_to_string(card: Card) -> Result<String, BadCard> {
    check_card(card)?;
    Ok(format!(
        "{}{}",
        rank_to_char(rank_of(card))?,
        suit_to_char(suit_of(card))?
    ))
}

/// Parses a whitespace/comma-tolerant sequence of two-character card strings,
/// e.g. `"As Kd 7c"` or `"AsKd7c"`.
pub fn parse_cards(s: &str) -> Result<Vec<Card>, BadCard> {
    let cleaned: String = s.chars().filter(|c| !c.is_whitespace() && *c != ',').collect();
    if !cleaned.len().is_multiple_of(2) {
        return Err(BadCard::Malformed(s.to_string()));
    }
    cleaned
        .as_bytes()
        .chunks(2)
        .map(|chunk| parse_card(std::str::from_utf8(chunk).unwrap()))
        .collect()
}

/// A sequence of 0, 3, 4, or 5 distinct board cards (spec §3).
pub type Board = Vec<Card>;

/// The betting street implied by a board's length, or `None` for an empty
/// (preflop) board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Street {
    Flop,
    Turn,
    River,
}

impl Street {
    pub fn from_board_len(len: usize) -> Option<Street> {
        match len {
            3 => Some(Street::Flop),
            4 => Some(Street::Turn),
            5 => Some(Street::River),
            _ => None,
        }
    }

    pub fn next(self) -> Option<Street> {
        match self {
            Street::Flop => Some(Street::Turn),
            Street::Turn => Some(Street::River),
            Street::River => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_id_round_trip() {
        for id in 0..52u8 {
            assert_eq!(card_to_id(id_to_card(id)), id);
            let s = card_to_string(id).unwrap();
            assert_eq!(parse_card(&s).unwrap(), id);
        }
    }

    #[test]
    fn bad_card_errors() {
        assert!(parse_card("Xs").is_err());
        assert!(parse_card("A").is_err());
        assert!(parse_card("Azz").is_err());
        assert!(card_to_string(52).is_err());
    }

    #[test]
    fn bitmask_round_trip() {
        let cards = parse_cards("As Kd 7c").unwrap();
        let mask = cards_to_bitmask(&cards);
        assert_eq!(mask.count_ones(), 3);
        for c in cards {
            assert_ne!(mask & card_to_bitmask(c), 0);
        }
    }

    #[test]
    fn street_from_len() {
        assert_eq!(Street::from_board_len(0), None);
        assert_eq!(Street::from_board_len(3), Some(Street::Flop));
        assert_eq!(Street::from_board_len(4), Some(Street::Turn));
        assert_eq!(Street::from_board_len(5), Some(Street::River));
        assert_eq!(Street::from_board_len(2), None);
    }
}
