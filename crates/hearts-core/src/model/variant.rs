use core::fmt;
use serde::{Deserialize, Serialize};

/// Bitmask of rule toggles that alter legality and scoring.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet(u32);

impl RuleSet {
    pub const QUEEN_PENALTY: u32 = 0x0001;
    pub const JACK_BONUS: u32 = 0x0002;
    pub const NO_TRICK_BONUS: u32 = 0x0004;
    pub const NO_QUEEN_FIRST_TRICK: u32 = 0x0008;
    pub const NO_HEARTS_FIRST_TRICK: u32 = 0x0010;
    pub const LEAD_CLUBS: u32 = 0x0020;
    pub const LEAD_TWO_CLUBS: u32 = 0x0040;
    pub const QUEEN_BREAKS_HEARTS: u32 = 0x0080;
    pub const DO_PASS_CARDS: u32 = 0x0400;
    pub const MUST_BREAK_HEARTS: u32 = 0x0800;

    pub const KNOWN_BITS: u32 = Self::QUEEN_PENALTY
        | Self::JACK_BONUS
        | Self::NO_TRICK_BONUS
        | Self::NO_QUEEN_FIRST_TRICK
        | Self::NO_HEARTS_FIRST_TRICK
        | Self::LEAD_CLUBS
        | Self::LEAD_TWO_CLUBS
        | Self::QUEEN_BREAKS_HEARTS
        | Self::DO_PASS_CARDS
        | Self::MUST_BREAK_HEARTS;

    /// Flag names as accepted in the named-boolean request form.
    pub const NAMED_FLAGS: [(&'static str, u32); 10] = [
        ("queen_penalty", Self::QUEEN_PENALTY),
        ("jack_bonus", Self::JACK_BONUS),
        ("no_trick_bonus", Self::NO_TRICK_BONUS),
        ("must_break_hearts", Self::MUST_BREAK_HEARTS),
        ("queen_breaks_hearts", Self::QUEEN_BREAKS_HEARTS),
        ("do_pass_cards", Self::DO_PASS_CARDS),
        ("no_hearts_first_trick", Self::NO_HEARTS_FIRST_TRICK),
        ("no_queen_first_trick", Self::NO_QUEEN_FIRST_TRICK),
        ("lead_clubs", Self::LEAD_CLUBS),
        ("lead_2_clubs", Self::LEAD_TWO_CLUBS),
    ];

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn empty() -> Self {
        Self(0)
    }

    /// The rule set assumed when a request names none.
    pub const fn standard() -> Self {
        Self(
            Self::QUEEN_PENALTY
                | Self::MUST_BREAK_HEARTS
                | Self::QUEEN_BREAKS_HEARTS
                | Self::NO_HEARTS_FIRST_TRICK
                | Self::NO_QUEEN_FIRST_TRICK
                | Self::LEAD_CLUBS,
        )
    }

    pub const fn has(self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    pub const fn with(self, flag: u32, enabled: bool) -> Self {
        if enabled {
            Self(self.0 | flag)
        } else {
            Self(self.0 & !flag)
        }
    }

    pub const fn unknown_bits(self) -> u32 {
        self.0 & !Self::KNOWN_BITS
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMED_FLAGS
            .iter()
            .filter(|(_, flag)| self.has(*flag))
            .map(|(name, _)| *name)
            .collect();
        write!(f, "RuleSet({:#06x} {:?})", self.0, names)
    }
}
