//! Card and rule encodings used on the JSON boundary.
//!
//! Cards arrive either as a `{rank}{suit}` token (`"10H"`, `"QS"`) or as an
//! indexed object `{"suit": 0..=3, "rank": 0..=12}` where suits run S, D, C, H
//! and ranks run from the ace (0) down to the two (12).

use hearts_core::model::card::Card;
use hearts_core::model::rank::Rank;
use hearts_core::model::suit::Suit;
use hearts_core::model::variant::RuleSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

const WIRE_SUITS: [Suit; 4] = [Suit::Spades, Suit::Diamonds, Suit::Clubs, Suit::Hearts];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("malformed card token '{0}'")]
    MalformedToken(String),
    #[error("suit index {0} is outside 0..=3")]
    SuitOutOfRange(i64),
    #[error("rank index {0} is outside 0..=12")]
    RankOutOfRange(i64),
    #[error("player index {0} is outside 0..=3")]
    SeatOutOfRange(i64),
    #[error("rules bitmask {0} is not a valid 32-bit mask")]
    RuleBitsOutOfRange(i64),
    #[error("unknown rule flag '{0}'")]
    UnknownRule(String),
    #[error("pass_direction {0} is not one of 0, 1, -1, 2")]
    PassDirection(i64),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("{context}: {message}")]
    InvalidTrick { context: String, message: String },
}

/// Which of the two card shapes a request used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardEncoding {
    Token,
    #[default]
    Indexed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireCard {
    Token(String),
    Indexed { suit: i64, rank: i64 },
}

impl WireCard {
    pub fn encoding(&self) -> CardEncoding {
        match self {
            WireCard::Token(_) => CardEncoding::Token,
            WireCard::Indexed { .. } => CardEncoding::Indexed,
        }
    }

    pub fn to_card(&self) -> Result<Card, WireError> {
        match self {
            WireCard::Token(text) => parse_token(text),
            WireCard::Indexed { suit, rank } => card_from_indices(*suit, *rank),
        }
    }

    pub fn encode(card: Card, encoding: CardEncoding) -> Self {
        match encoding {
            CardEncoding::Token => WireCard::Token(card.to_string()),
            CardEncoding::Indexed => {
                let (suit, rank) = card_indices(card);
                WireCard::Indexed { suit, rank }
            }
        }
    }
}

pub fn parse_token(text: &str) -> Result<Card, WireError> {
    let malformed = || WireError::MalformedToken(text.to_string());
    let trimmed = text.trim();
    let mut chars = trimmed.chars();
    let suit_symbol = chars.next_back().ok_or_else(malformed)?;
    let suit = Suit::from_symbol(suit_symbol).ok_or_else(malformed)?;
    let rank = Rank::from_symbol(chars.as_str()).ok_or_else(malformed)?;
    Ok(Card::new(rank, suit))
}

pub fn card_from_indices(suit: i64, rank: i64) -> Result<Card, WireError> {
    let suit = usize::try_from(suit)
        .ok()
        .and_then(|index| WIRE_SUITS.get(index).copied())
        .ok_or(WireError::SuitOutOfRange(suit))?;
    let rank = u8::try_from(rank)
        .ok()
        .filter(|index| *index <= 12)
        .and_then(|index| Rank::from_value(14 - index))
        .ok_or(WireError::RankOutOfRange(rank))?;
    Ok(Card::new(rank, suit))
}

pub fn card_indices(card: Card) -> (i64, i64) {
    let suit = WIRE_SUITS
        .iter()
        .position(|suit| *suit == card.suit)
        .unwrap_or_default() as i64;
    (suit, 14 - i64::from(card.rank.value()))
}

/// Rule selection: a raw bitmask or an object of named booleans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireRules {
    Bits(i64),
    Flags(BTreeMap<String, bool>),
}

impl WireRules {
    /// Named flags start from the standard set and toggle individual rules.
    pub fn to_rules(&self) -> Result<RuleSet, WireError> {
        match self {
            WireRules::Bits(bits) => u32::try_from(*bits)
                .map(RuleSet::from_bits)
                .map_err(|_| WireError::RuleBitsOutOfRange(*bits)),
            WireRules::Flags(flags) => {
                let mut rules = RuleSet::standard();
                for (name, enabled) in flags {
                    let (_, flag) = RuleSet::NAMED_FLAGS
                        .iter()
                        .find(|(known, _)| known == name)
                        .ok_or_else(|| WireError::UnknownRule(name.clone()))?;
                    rules = rules.with(*flag, *enabled);
                }
                Ok(rules)
            }
        }
    }
}
