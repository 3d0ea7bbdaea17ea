//! Cardinal facings for a rotating robot.

/// One of the four cardinal facings a robot can hold.
///
/// Discriminants match the wire encoding in the arena protocol: East=0,
/// South=1, West=2, North=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Facing {
    East = 0,
    South = 1,
    West = 2,
    North = 3,
}

impl Facing {
    /// All four facings in wire-encoding order.
    pub const ALL: [Facing; 4] = [Facing::East, Facing::South, Facing::West, Facing::North];

    /// Rotate 90 degrees clockwise.
    pub fn rotate_cw(self) -> Facing {
        match self {
            Facing::East => Facing::South,
            Facing::South => Facing::West,
            Facing::West => Facing::North,
            Facing::North => Facing::East,
        }
    }

    /// Rotate 90 degrees counter-clockwise.
    pub fn rotate_ccw(self) -> Facing {
        match self {
            Facing::East => Facing::North,
            Facing::North => Facing::West,
            Facing::West => Facing::South,
            Facing::South => Facing::East,
        }
    }

    /// The (row delta, col delta) of a forward step while holding this facing.
    pub fn forward_delta(self) -> (i32, i32) {
        match self {
            Facing::East => (0, 1),
            Facing::South => (1, 0),
            Facing::West => (0, -1),
            Facing::North => (-1, 0),
        }
    }

    /// The facing opposite this one (used by the reverse-Dijkstra distance oracle).
    pub fn opposite(self) -> Facing {
        match self {
            Facing::East => Facing::West,
            Facing::West => Facing::East,
            Facing::South => Facing::North,
            Facing::North => Facing::South,
        }
    }
}

impl TryFrom<u8> for Facing {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Facing::East),
            1 => Ok(Facing::South),
            2 => Ok(Facing::West),
            3 => Ok(Facing::North),
            _ => Err(()),
        }
    }
}
