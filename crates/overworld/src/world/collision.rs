//! Movement legality. Everything here reads the world and never mutates it;
//! `Obj` applies the outcome.

use crate::content::{LoadError, Passage};

use super::behavior::BehaviorAttributes;
use super::direction::Direction;
use super::obj::{MovementMode, Position};
use super::registry::{CellOwner, Registry, ResolvedCell};

/// Where a legal move ends, and how many cells it covers (2 for a ledge jump).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub position: Position,
    pub cells: i32,
}

/// Corner-cutting requirements for one diagonal. Each orthogonal neighbour
/// must carry the passage bit for the corner the move cuts through, and must
/// not be blocked toward the diagonal target or back toward the origin.
struct DiagonalRule {
    direction: Direction,
    horizontal: Direction,
    horizontal_corner: Passage,
    horizontal_blocked: [Direction; 2],
    vertical: Direction,
    vertical_corner: Passage,
    vertical_blocked: [Direction; 2],
}

static DIAGONAL_RULES: [DiagonalRule; 4] = [
    DiagonalRule {
        direction: Direction::Southwest,
        horizontal: Direction::West,
        horizontal_corner: Passage::SOUTHEAST,
        horizontal_blocked: [Direction::South, Direction::East],
        vertical: Direction::South,
        vertical_corner: Passage::NORTHWEST,
        vertical_blocked: [Direction::West, Direction::North],
    },
    DiagonalRule {
        direction: Direction::Southeast,
        horizontal: Direction::East,
        horizontal_corner: Passage::SOUTHWEST,
        horizontal_blocked: [Direction::South, Direction::West],
        vertical: Direction::South,
        vertical_corner: Passage::NORTHEAST,
        vertical_blocked: [Direction::East, Direction::North],
    },
    DiagonalRule {
        direction: Direction::Northwest,
        horizontal: Direction::West,
        horizontal_corner: Passage::NORTHEAST,
        horizontal_blocked: [Direction::North, Direction::East],
        vertical: Direction::North,
        vertical_corner: Passage::SOUTHWEST,
        vertical_blocked: [Direction::West, Direction::South],
    },
    DiagonalRule {
        direction: Direction::Northeast,
        horizontal: Direction::East,
        horizontal_corner: Passage::NORTHWEST,
        horizontal_blocked: [Direction::North, Direction::West],
        vertical: Direction::North,
        vertical_corner: Passage::SOUTHEAST,
        vertical_blocked: [Direction::East, Direction::South],
    },
];

fn diagonal_rule(direction: Direction) -> Option<&'static DiagonalRule> {
    DIAGONAL_RULES.iter().find(|rule| rule.direction == direction)
}

/// Decides whether a mover standing at `from` may step toward `direction`.
/// `None` means blocked; the discrete position must then stay put.
pub fn resolve_move(
    registry: &Registry,
    from: Position,
    direction: Direction,
    mode: MovementMode,
) -> Result<Option<Destination>, LoadError> {
    let Some(origin) = registry.get_block(from.map, from.x, from.y)? else {
        return Ok(None);
    };
    match diagonal_rule(direction) {
        Some(rule) => resolve_diagonal(registry, from, &origin, rule, mode),
        None => resolve_cardinal(registry, from, &origin, direction, mode),
    }
}

fn resolve_cardinal(
    registry: &Registry,
    from: Position,
    origin: &ResolvedCell,
    direction: Direction,
    mode: MovementMode,
) -> Result<Option<Destination>, LoadError> {
    if attributes(origin).blocked.has(direction) {
        return Ok(None);
    }
    let (dx, dy) = direction.offset();
    let Some(target) = registry.get_block(from.map, from.x + dx, from.y + dy)? else {
        return Ok(None);
    };
    if !accepts_entry(&target, direction, mode) {
        return Ok(None);
    }

    if let Some(ledge) = attributes(&target).ledge {
        if ledge != direction {
            return Ok(None);
        }
        let Some(landing) = registry.get_block(from.map, from.x + 2 * dx, from.y + 2 * dy)? else {
            return Ok(None);
        };
        if !accepts_entry(&landing, direction, mode)
            || attributes(&landing).ledge.is_some()
            || !elevation_allows(from.elevation, origin, &landing)
        {
            return Ok(None);
        }
        return Ok(destination(&landing, 2));
    }

    if !elevation_allows(from.elevation, origin, &target) {
        return Ok(None);
    }
    Ok(destination(&target, 1))
}

fn resolve_diagonal(
    registry: &Registry,
    from: Position,
    origin: &ResolvedCell,
    rule: &DiagonalRule,
    mode: MovementMode,
) -> Result<Option<Destination>, LoadError> {
    let exits = attributes(origin).blocked;
    if exits.has(rule.direction) || exits.has(rule.horizontal) || exits.has(rule.vertical) {
        return Ok(None);
    }

    let sides = [
        (rule.horizontal, rule.horizontal_corner, rule.horizontal_blocked),
        (rule.vertical, rule.vertical_corner, rule.vertical_blocked),
    ];
    for (side, corner, blocked) in sides {
        let (sx, sy) = side.offset();
        let Some(neighbour) = registry.get_block(from.map, from.x + sx, from.y + sy)? else {
            return Ok(None);
        };
        if !neighbour.cell.passage().contains(corner) {
            return Ok(None);
        }
        let neighbour_blocked = attributes(&neighbour).blocked;
        if blocked.iter().any(|edge| neighbour_blocked.has(*edge)) {
            return Ok(None);
        }
    }

    let (dx, dy) = rule.direction.offset();
    let Some(target) = registry.get_block(from.map, from.x + dx, from.y + dy)? else {
        return Ok(None);
    };
    if !accepts_entry(&target, rule.direction, mode)
        || attributes(&target).ledge.is_some()
        || !elevation_allows(from.elevation, origin, &target)
    {
        return Ok(None);
    }
    Ok(destination(&target, 1))
}

fn attributes(resolved: &ResolvedCell) -> &'static BehaviorAttributes {
    resolved.cell.block().behavior().attributes()
}

fn accepts_entry(target: &ResolvedCell, direction: Direction, mode: MovementMode) -> bool {
    let attrs = attributes(target);
    target.cell.allows_occupancy()
        && !attrs.blocked.has(direction.opposite())
        && (!attrs.surf_only || mode == MovementMode::Surfing)
}

/// A mover keeps its elevation unless one side of the step is a block that
/// allows changing it.
fn elevation_allows(mover: u8, origin: &ResolvedCell, target: &ResolvedCell) -> bool {
    target.cell.elevation() == mover
        || attributes(origin).allows_elevation_change
        || attributes(target).allows_elevation_change
}

/// Border cells are scenery; only real layout cells can be stood on.
fn destination(target: &ResolvedCell, cells: i32) -> Option<Destination> {
    match target.owner {
        CellOwner::Map { map, x, y } => Some(Destination {
            position: Position {
                map,
                x,
                y,
                elevation: target.cell.elevation(),
            },
            cells,
        }),
        CellOwner::Border { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{behavior_map, CellSpec, TestMap};
    use crate::world::Behavior;

    fn at(fixture: &TestMap, x: i32, y: i32) -> Position {
        Position {
            map: fixture.map,
            x,
            y,
            elevation: 0,
        }
    }

    fn walk(fixture: &TestMap, x: i32, y: i32, direction: Direction) -> Option<Destination> {
        resolve_move(
            &fixture.registry,
            at(fixture, x, y),
            direction,
            MovementMode::Walking,
        )
        .expect("resolve")
    }

    #[test]
    fn open_cardinal_step_moves_one_cell() {
        let fixture = behavior_map(3, 3, |_, _| {});
        let destination = walk(&fixture, 1, 1, Direction::South).expect("open");
        assert_eq!(destination.position, at(&fixture, 1, 2));
        assert_eq!(destination.cells, 1);
    }

    #[test]
    fn origin_behavior_blocks_exit() {
        let fixture = behavior_map(3, 3, |layout, blockset| {
            layout.set(1, 1, CellSpec::behavior(blockset, Behavior::BlockedS));
        });
        assert!(walk(&fixture, 1, 1, Direction::South).is_none());
        assert!(walk(&fixture, 1, 1, Direction::North).is_some());
    }

    #[test]
    fn target_behavior_blocks_entry_from_opposite_side() {
        let fixture = behavior_map(3, 3, |layout, blockset| {
            layout.set(1, 2, CellSpec::behavior(blockset, Behavior::BlockedN));
        });
        assert!(walk(&fixture, 1, 1, Direction::South).is_none());
        assert!(walk(&fixture, 0, 2, Direction::East).is_some());
    }

    #[test]
    fn target_without_occupancy_is_blocked() {
        let fixture = behavior_map(3, 3, |layout, blockset| {
            layout.set(
                2,
                1,
                CellSpec::new(blockset, 0, 0, Passage::all().difference(Passage::ALLOW_OCCUPANCY)),
            );
        });
        assert!(walk(&fixture, 1, 1, Direction::East).is_none());
    }

    #[test]
    fn water_needs_surfing() {
        let fixture = behavior_map(3, 3, |layout, blockset| {
            layout.set(1, 0, CellSpec::behavior(blockset, Behavior::Surf));
            layout.set(0, 0, CellSpec::behavior(blockset, Behavior::Surf));
        });
        assert!(walk(&fixture, 1, 1, Direction::North).is_none());
        assert!(walk(&fixture, 1, 1, Direction::Northwest).is_none());
        let surfing = resolve_move(
            &fixture.registry,
            at(&fixture, 1, 1),
            Direction::North,
            MovementMode::Surfing,
        )
        .expect("resolve");
        assert!(surfing.is_some());
    }

    #[test]
    fn walking_off_the_map_into_void_is_blocked() {
        let fixture = behavior_map(3, 3, |_, _| {});
        assert!(walk(&fixture, 0, 0, Direction::West).is_none());
        assert!(walk(&fixture, 2, 2, Direction::Southeast).is_none());
    }

    #[test]
    fn southwest_blocked_by_west_cell_blocked_east() {
        let fixture = behavior_map(3, 3, |layout, blockset| {
            layout.set(0, 1, CellSpec::behavior(blockset, Behavior::BlockedE));
        });
        assert!(walk(&fixture, 1, 1, Direction::Southwest).is_none());
        assert!(walk(&fixture, 1, 1, Direction::Southeast).is_some());
    }

    #[test]
    fn every_diagonal_needs_both_corner_bits() {
        let cases = [
            (Direction::Southwest, (0, 1), Passage::SOUTHEAST, (1, 2), Passage::NORTHWEST),
            (Direction::Southeast, (2, 1), Passage::SOUTHWEST, (1, 2), Passage::NORTHEAST),
            (Direction::Northwest, (0, 1), Passage::NORTHEAST, (1, 0), Passage::SOUTHWEST),
            (Direction::Northeast, (2, 1), Passage::NORTHWEST, (1, 0), Passage::SOUTHEAST),
        ];
        for (direction, h_cell, h_bit, v_cell, v_bit) in cases {
            let open = behavior_map(3, 3, |_, _| {});
            assert!(walk(&open, 1, 1, direction).is_some(), "{direction:?} open");

            for (cell, bit) in [(h_cell, h_bit), (v_cell, v_bit)] {
                let fixture = behavior_map(3, 3, |layout, blockset| {
                    layout.set(
                        cell.0,
                        cell.1,
                        CellSpec::new(blockset, 0, 0, Passage::all().difference(bit)),
                    );
                });
                assert!(
                    walk(&fixture, 1, 1, direction).is_none(),
                    "{direction:?} without {bit:?} at {cell:?}"
                );
            }
        }
    }

    #[test]
    fn diagonal_neighbour_blocked_toward_origin_stops_the_cut() {
        let fixture = behavior_map(3, 3, |layout, blockset| {
            layout.set(1, 0, CellSpec::behavior(blockset, Behavior::BlockedS));
        });
        assert!(walk(&fixture, 1, 1, Direction::Northeast).is_none());
        assert!(walk(&fixture, 1, 1, Direction::Southeast).is_some());
    }

    #[test]
    fn diagonal_target_blocked_from_opposite_diagonal() {
        let fixture = behavior_map(3, 3, |layout, blockset| {
            layout.set(0, 2, CellSpec::behavior(blockset, Behavior::BlockedNE));
        });
        assert!(walk(&fixture, 1, 1, Direction::Southwest).is_none());
    }

    #[test]
    fn ledge_is_jumped_only_in_its_direction() {
        let fixture = behavior_map(3, 4, |layout, blockset| {
            layout.set(1, 1, CellSpec::behavior(blockset, Behavior::LedgeS));
        });
        let jump = walk(&fixture, 1, 0, Direction::South).expect("jump");
        assert_eq!(jump.position, at(&fixture, 1, 2));
        assert_eq!(jump.cells, 2);
        assert!(walk(&fixture, 1, 2, Direction::North).is_none());
        assert!(walk(&fixture, 0, 1, Direction::East).is_none());
    }

    #[test]
    fn elevation_changes_need_a_transition_block() {
        let fixture = behavior_map(3, 3, |layout, blockset| {
            layout.set(1, 0, CellSpec::new(blockset, 0, 3, Passage::all()));
            layout.set(
                2,
                1,
                CellSpec::new(blockset, Behavior::AllowElevationChange as i32, 3, Passage::all()),
            );
        });
        assert!(walk(&fixture, 1, 1, Direction::North).is_none());
        let stairs = walk(&fixture, 1, 1, Direction::East).expect("stairs");
        assert_eq!(stairs.position.elevation, 3);
    }
}
