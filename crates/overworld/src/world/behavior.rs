//! Block behaviors and the attribute table every movement and trigger check
//! reads from.

use crate::content::EncounterKind;

use super::direction::{Direction, DirectionSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Behavior {
    #[default]
    None = 0,
    AllowElevationChange = 1,
    Surf = 2,
    GrassEncounter = 3,
    GrassSpecialEncounter = 4,
    TallGrassEncounter = 5,
    CaveEncounter = 6,
    Waterfall = 7,
    BlockedN = 8,
    BlockedNE = 9,
    BlockedE = 10,
    BlockedSE = 11,
    BlockedS = 12,
    BlockedSW = 13,
    BlockedW = 14,
    BlockedNW = 15,
    LedgeN = 16,
    LedgeE = 17,
    LedgeS = 18,
    LedgeW = 19,
    StairW = 20,
    StairE = 21,
    WarpTeleport = 22,
    WarpDoor = 23,
    Sign = 24,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BehaviorAttributes {
    /// Edges of the block that cannot be crossed, neither leaving toward them
    /// nor entering from them.
    pub blocked: DirectionSet,
    pub surf_only: bool,
    pub encounter: Option<EncounterKind>,
    /// Direction a ledge may be jumped down in.
    pub ledge: Option<Direction>,
    pub warp: bool,
    pub sign: bool,
    pub allows_elevation_change: bool,
}

impl BehaviorAttributes {
    const OPEN: BehaviorAttributes = BehaviorAttributes {
        blocked: DirectionSet::empty(),
        surf_only: false,
        encounter: None,
        ledge: None,
        warp: false,
        sign: false,
        allows_elevation_change: false,
    };

    const fn blocked(blocked: DirectionSet) -> Self {
        Self {
            blocked,
            ..Self::OPEN
        }
    }

    const fn encounter(kind: EncounterKind) -> Self {
        Self {
            encounter: Some(kind),
            ..Self::OPEN
        }
    }

    const fn ledge(direction: Direction) -> Self {
        Self {
            ledge: Some(direction),
            ..Self::OPEN
        }
    }
}

const BEHAVIOR_COUNT: usize = 25;

static BEHAVIOR_TABLE: [BehaviorAttributes; BEHAVIOR_COUNT] = [
    // None
    BehaviorAttributes::OPEN,
    // AllowElevationChange
    BehaviorAttributes {
        allows_elevation_change: true,
        ..BehaviorAttributes::OPEN
    },
    // Surf
    BehaviorAttributes {
        surf_only: true,
        encounter: Some(EncounterKind::Surf),
        ..BehaviorAttributes::OPEN
    },
    // GrassEncounter
    BehaviorAttributes::encounter(EncounterKind::Default),
    // GrassSpecialEncounter
    BehaviorAttributes::encounter(EncounterKind::Special),
    // TallGrassEncounter
    BehaviorAttributes::encounter(EncounterKind::DarkGrass),
    // CaveEncounter
    BehaviorAttributes::encounter(EncounterKind::Default),
    // Waterfall
    BehaviorAttributes {
        blocked: DirectionSet::all(),
        surf_only: true,
        ..BehaviorAttributes::OPEN
    },
    // BlockedN .. BlockedNW
    BehaviorAttributes::blocked(DirectionSet::NORTH),
    BehaviorAttributes::blocked(DirectionSet::NORTHEAST),
    BehaviorAttributes::blocked(DirectionSet::EAST),
    BehaviorAttributes::blocked(DirectionSet::SOUTHEAST),
    BehaviorAttributes::blocked(DirectionSet::SOUTH),
    BehaviorAttributes::blocked(DirectionSet::SOUTHWEST),
    BehaviorAttributes::blocked(DirectionSet::WEST),
    BehaviorAttributes::blocked(DirectionSet::NORTHWEST),
    // LedgeN .. LedgeW
    BehaviorAttributes::ledge(Direction::North),
    BehaviorAttributes::ledge(Direction::East),
    BehaviorAttributes::ledge(Direction::South),
    BehaviorAttributes::ledge(Direction::West),
    // StairW, StairE
    BehaviorAttributes {
        allows_elevation_change: true,
        ..BehaviorAttributes::OPEN
    },
    BehaviorAttributes {
        allows_elevation_change: true,
        ..BehaviorAttributes::OPEN
    },
    // WarpTeleport
    BehaviorAttributes {
        warp: true,
        ..BehaviorAttributes::OPEN
    },
    // WarpDoor
    BehaviorAttributes {
        warp: true,
        ..BehaviorAttributes::OPEN
    },
    // Sign
    BehaviorAttributes {
        sign: true,
        ..BehaviorAttributes::OPEN
    },
];

impl Behavior {
    pub fn from_u8(raw: u8) -> Option<Self> {
        let behavior = match raw {
            0 => Behavior::None,
            1 => Behavior::AllowElevationChange,
            2 => Behavior::Surf,
            3 => Behavior::GrassEncounter,
            4 => Behavior::GrassSpecialEncounter,
            5 => Behavior::TallGrassEncounter,
            6 => Behavior::CaveEncounter,
            7 => Behavior::Waterfall,
            8 => Behavior::BlockedN,
            9 => Behavior::BlockedNE,
            10 => Behavior::BlockedE,
            11 => Behavior::BlockedSE,
            12 => Behavior::BlockedS,
            13 => Behavior::BlockedSW,
            14 => Behavior::BlockedW,
            15 => Behavior::BlockedNW,
            16 => Behavior::LedgeN,
            17 => Behavior::LedgeE,
            18 => Behavior::LedgeS,
            19 => Behavior::LedgeW,
            20 => Behavior::StairW,
            21 => Behavior::StairE,
            22 => Behavior::WarpTeleport,
            23 => Behavior::WarpDoor,
            24 => Behavior::Sign,
            _ => return None,
        };
        Some(behavior)
    }

    pub fn attributes(self) -> &'static BehaviorAttributes {
        &BEHAVIOR_TABLE[self as usize]
    }

    pub fn blocks(self, direction: Direction) -> bool {
        self.attributes().blocked.has(direction)
    }
}
