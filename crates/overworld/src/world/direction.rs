use bitflags::bitflags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    South,
    North,
    West,
    East,
    Southwest,
    Southeast,
    Northwest,
    Northeast,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::South,
        Direction::North,
        Direction::West,
        Direction::East,
        Direction::Southwest,
        Direction::Southeast,
        Direction::Northwest,
        Direction::Northeast,
    ];

    /// Grid delta; +y points south.
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::South => (0, 1),
            Direction::North => (0, -1),
            Direction::West => (-1, 0),
            Direction::East => (1, 0),
            Direction::Southwest => (-1, 1),
            Direction::Southeast => (1, 1),
            Direction::Northwest => (-1, -1),
            Direction::Northeast => (1, -1),
        }
    }

    pub const fn opposite(self) -> Direction {
        match self {
            Direction::South => Direction::North,
            Direction::North => Direction::South,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
            Direction::Southwest => Direction::Northeast,
            Direction::Southeast => Direction::Northwest,
            Direction::Northwest => Direction::Southeast,
            Direction::Northeast => Direction::Southwest,
        }
    }

    pub const fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::Southwest
                | Direction::Southeast
                | Direction::Northwest
                | Direction::Northeast
        )
    }

    pub const fn as_set(self) -> DirectionSet {
        match self {
            Direction::South => DirectionSet::SOUTH,
            Direction::North => DirectionSet::NORTH,
            Direction::West => DirectionSet::WEST,
            Direction::East => DirectionSet::EAST,
            Direction::Southwest => DirectionSet::SOUTHWEST,
            Direction::Southeast => DirectionSet::SOUTHEAST,
            Direction::Northwest => DirectionSet::NORTHWEST,
            Direction::Northeast => DirectionSet::NORTHEAST,
        }
    }

    /// Combines a vertical and a horizontal input into one facing.
    pub fn from_axes(vertical: Option<Direction>, horizontal: Option<Direction>) -> Option<Self> {
        match (vertical, horizontal) {
            (Some(Direction::South), Some(Direction::West)) => Some(Direction::Southwest),
            (Some(Direction::South), Some(Direction::East)) => Some(Direction::Southeast),
            (Some(Direction::North), Some(Direction::West)) => Some(Direction::Northwest),
            (Some(Direction::North), Some(Direction::East)) => Some(Direction::Northeast),
            (Some(v), None) => Some(v),
            (None, Some(h)) => Some(h),
            _ => None,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DirectionSet: u8 {
        const SOUTH = 1 << 0;
        const NORTH = 1 << 1;
        const WEST = 1 << 2;
        const EAST = 1 << 3;
        const SOUTHWEST = 1 << 4;
        const SOUTHEAST = 1 << 5;
        const NORTHWEST = 1 << 6;
        const NORTHEAST = 1 << 7;
    }
}

impl DirectionSet {
    pub fn has(self, direction: Direction) -> bool {
        self.contains(direction.as_set())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution_and_negates_offset() {
        for direction in Direction::ALL {
            assert_eq!(direction.opposite().opposite(), direction);
            let (dx, dy) = direction.offset();
            assert_eq!(direction.opposite().offset(), (-dx, -dy));
        }
    }

    #[test]
    fn diagonals_have_two_nonzero_components() {
        for direction in Direction::ALL {
            let (dx, dy) = direction.offset();
            assert_eq!(direction.is_diagonal(), dx != 0 && dy != 0);
        }
    }

    #[test]
    fn axes_combine_into_diagonals() {
        assert_eq!(
            Direction::from_axes(Some(Direction::North), Some(Direction::East)),
            Some(Direction::Northeast)
        );
        assert_eq!(
            Direction::from_axes(None, Some(Direction::West)),
            Some(Direction::West)
        );
        assert_eq!(Direction::from_axes(None, None), None);
    }
}
