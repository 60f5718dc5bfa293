use core::fmt;
use serde::{Deserialize, Serialize};

/// Seat at the table. The index doubles as the wire player number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlayerPosition {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl PlayerPosition {
    pub const LOOP: [PlayerPosition; 4] = [
        PlayerPosition::North,
        PlayerPosition::East,
        PlayerPosition::South,
        PlayerPosition::West,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::LOOP.get(index).copied()
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Seat reached after `steps` clockwise moves.
    pub fn advance(self, steps: usize) -> PlayerPosition {
        Self::LOOP[(self.index() + steps) % 4]
    }

    pub fn next(self) -> PlayerPosition {
        self.advance(1)
    }

    /// The three other seats in clockwise order starting after `self`.
    pub fn others(self) -> [PlayerPosition; 3] {
        [self.advance(1), self.advance(2), self.advance(3)]
    }
}

impl fmt::Display for PlayerPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlayerPosition::North => "North",
            PlayerPosition::East => "East",
            PlayerPosition::South => "South",
            PlayerPosition::West => "West",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::PlayerPosition;

    #[test]
    fn seats_cycle_clockwise_from_north() {
        let mut seat = PlayerPosition::North;
        for expected in [1, 2, 3, 0] {
            seat = seat.next();
            assert_eq!(seat.index(), expected);
        }
        assert_eq!(PlayerPosition::East.advance(6), PlayerPosition::West);
    }

    #[test]
    fn others_skip_self() {
        let others = PlayerPosition::South.others();
        assert_eq!(others[0], PlayerPosition::West);
        assert!(!others.contains(&PlayerPosition::South));
    }

    #[test]
    fn wire_indices_map_to_seats() {
        assert_eq!(PlayerPosition::from_index(2), Some(PlayerPosition::South));
        assert_eq!(PlayerPosition::from_index(4), None);
    }
}
