use std::collections::{BTreeMap, HashSet};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::MovementSpeeds;
use crate::content::{LoadError, MapId, Warp};

use super::behavior::Behavior;
use super::collision::resolve_move;
use super::direction::Direction;
use super::obj::{Obj, ObjId, ObjKind, Position};
use super::registry::{CellOwner, Registry};

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("no obj with id {0}")]
    UnknownObj(ObjId),
    #[error("warp destination ({x}, {y}) is not a cell of map {map}")]
    WarpOutOfBounds { map: MapId, x: i32, y: i32 },
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// A completed successful move, reported by `World::tick` so the caller can
/// run step triggers (encounters, warps, signs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrival {
    pub obj: ObjId,
    pub position: Position,
    pub behavior: Behavior,
}

/// Registry plus every live Obj. All mutation happens on the owning thread,
/// one logic tick at a time.
pub struct World {
    registry: Registry,
    speeds: MovementSpeeds,
    objs: BTreeMap<ObjId, Obj>,
    populated: HashSet<MapId>,
    next_id: u32,
}

impl World {
    pub fn new(registry: Registry, speeds: MovementSpeeds) -> Self {
        Self {
            registry,
            speeds,
            objs: BTreeMap::new(),
            populated: HashSet::new(),
            next_id: 0,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn spawn(&mut self, obj: Obj) -> ObjId {
        let id = ObjId(self.next_id);
        self.next_id += 1;
        let position = obj.position();
        debug!(
            obj = %id,
            map_id = position.map,
            x = position.x,
            y = position.y,
            "obj_spawned"
        );
        self.objs.insert(id, obj);
        id
    }

    pub fn remove(&mut self, id: ObjId) -> Option<Obj> {
        self.objs.remove(&id)
    }

    pub fn obj(&self, id: ObjId) -> Option<&Obj> {
        self.objs.get(&id)
    }

    pub fn obj_mut(&mut self, id: ObjId) -> Option<&mut Obj> {
        self.objs.get_mut(&id)
    }

    pub fn objs(&self) -> impl Iterator<Item = (ObjId, &Obj)> {
        self.objs.iter().map(|(id, obj)| (*id, obj))
    }

    pub fn objs_on_map(&self, map: MapId) -> impl Iterator<Item = (ObjId, &Obj)> {
        self.objs().filter(move |(_, obj)| obj.position().map == map)
    }

    /// Spawns the map's declared NPCs once; repeated calls are no-ops until
    /// the map's objs are removed again.
    pub fn populate_map_objs(&mut self, map_id: MapId) -> Result<Vec<ObjId>, LoadError> {
        if self.populated.contains(&map_id) {
            return Ok(Vec::new());
        }
        let map = self.registry.map(map_id)?;
        let mut spawned = Vec::with_capacity(map.events().objs.len());
        for event in &map.events().objs {
            let position = Position {
                map: map_id,
                x: event.x,
                y: event.y,
                elevation: event.elevation,
            };
            let kind = ObjKind::Npc {
                event_id: event.id,
                movement: event.movement,
            };
            spawned.push(self.spawn(Obj::new(kind, position, event.color)));
        }
        self.populated.insert(map_id);
        info!(map_id, obj_count = spawned.len(), "map_objs_populated");
        Ok(spawned)
    }

    /// Unloads every NPC on `map`. The player is never removed this way.
    pub fn remove_objs_on_map(&mut self, map: MapId) -> usize {
        let before = self.objs.len();
        self.objs.retain(|_, obj| {
            obj.position().map != map || matches!(obj.kind(), ObjKind::Player)
        });
        self.populated.remove(&map);
        let removed = before - self.objs.len();
        debug!(map_id = map, removed, "map_objs_removed");
        removed
    }

    /// Moves one Obj. Besides the terrain rules a destination held by another
    /// Obj blocks the move.
    pub fn move_obj(
        &mut self,
        id: ObjId,
        direction: Direction,
        running: bool,
    ) -> Result<bool, WorldError> {
        let obj = self.objs.get(&id).ok_or(WorldError::UnknownObj(id))?;
        if !obj.can_move() {
            return Ok(false);
        }
        let from = obj.position();
        let mut destination = resolve_move(&self.registry, from, direction, obj.mode())?;
        if let Some(target) = destination {
            if self.is_occupied(id, target.position) {
                destination = None;
            }
        }

        let obj = self.objs.get_mut(&id).ok_or(WorldError::UnknownObj(id))?;
        let moved = obj.begin_move(direction, running, destination, &self.speeds);
        let to = obj.position();
        if moved && to.map != from.map {
            info!(obj = %id, from_map = from.map, to_map = to.map, "obj_changed_map");
        }
        Ok(moved)
    }

    pub fn face_obj(&mut self, id: ObjId, direction: Direction) -> Result<bool, WorldError> {
        let obj = self.objs.get_mut(&id).ok_or(WorldError::UnknownObj(id))?;
        Ok(obj.face(direction))
    }

    fn is_occupied(&self, mover: ObjId, position: Position) -> bool {
        self.objs.iter().any(|(id, obj)| {
            let other = obj.position();
            *id != mover
                && other.map == position.map
                && other.x == position.x
                && other.y == position.y
        })
    }

    /// Advances every movement timer by one tick and reports the moves that
    /// completed on this tick.
    pub fn tick(&mut self) -> Result<Vec<Arrival>, LoadError> {
        let mut arrived = Vec::new();
        for (id, obj) in self.objs.iter_mut() {
            if obj.update_movement_timer() {
                arrived.push((*id, obj.position()));
            }
        }

        let mut arrivals = Vec::with_capacity(arrived.len());
        for (obj, position) in arrived {
            let resolved = self.registry.get_block(position.map, position.x, position.y)?;
            let Some(resolved) = resolved else {
                continue;
            };
            arrivals.push(Arrival {
                obj,
                position,
                behavior: resolved.cell.block().behavior(),
            });
        }
        Ok(arrivals)
    }

    pub fn warp_at(&self, id: ObjId) -> Result<Option<Warp>, WorldError> {
        let obj = self.objs.get(&id).ok_or(WorldError::UnknownObj(id))?;
        let position = obj.position();
        Ok(self
            .registry
            .warp_at(position.map, position.x, position.y, position.elevation)?)
    }

    /// Teleports an Obj to a warp's destination. The destination must be a
    /// real cell of the target map.
    pub fn apply_warp(&mut self, id: ObjId, warp: &Warp) -> Result<(), WorldError> {
        let resolved = self
            .registry
            .get_block(warp.dest_map, warp.dest_x, warp.dest_y)?;
        let in_bounds = matches!(
            resolved.map(|cell| cell.owner),
            Some(CellOwner::Map { map, .. }) if map == warp.dest_map
        );
        if !in_bounds {
            return Err(WorldError::WarpOutOfBounds {
                map: warp.dest_map,
                x: warp.dest_x,
                y: warp.dest_y,
            });
        }

        let obj = self.objs.get_mut(&id).ok_or(WorldError::UnknownObj(id))?;
        let from = obj.position();
        obj.place(Position {
            map: warp.dest_map,
            x: warp.dest_x,
            y: warp.dest_y,
            elevation: warp.dest_elevation,
        });
        info!(
            obj = %id,
            from_map = from.map,
            to_map = warp.dest_map,
            x = warp.dest_x,
            y = warp.dest_y,
            "obj_warped"
        );
        Ok(())
    }
}
