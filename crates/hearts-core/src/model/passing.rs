use serde::{Deserialize, Serialize};

/// Direction cards were passed before the hand. Carried through requests but
/// never acted on by the decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PassDirection {
    #[default]
    Hold,
    Left,
    Right,
    Across,
}

impl PassDirection {
    /// Maps the numeric wire value (`0` hold, `1` left, `-1` right, `2` across).
    pub const fn from_wire(value: i64) -> Option<Self> {
        match value {
            0 => Some(PassDirection::Hold),
            1 => Some(PassDirection::Left),
            -1 => Some(PassDirection::Right),
            2 => Some(PassDirection::Across),
            _ => None,
        }
    }

    pub const fn to_wire(self) -> i64 {
        match self {
            PassDirection::Hold => 0,
            PassDirection::Left => 1,
            PassDirection::Right => -1,
            PassDirection::Across => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PassDirection;

    #[test]
    fn wire_values_roundtrip() {
        for direction in [
            PassDirection::Hold,
            PassDirection::Left,
            PassDirection::Right,
            PassDirection::Across,
        ] {
            assert_eq!(PassDirection::from_wire(direction.to_wire()), Some(direction));
        }
        assert_eq!(PassDirection::from_wire(3), None);
    }
}
