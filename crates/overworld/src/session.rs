use tracing::{debug, info};

use crate::content::{LoadError, MapId};
use crate::render::{draw_map, Frame};
use crate::world::{Arrival, Direction, MovementMode, ObjId, World, WorldError};

/// Player intent for one logic tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepInput {
    pub direction: Option<Direction>,
    pub running: bool,
    pub toggle_surf: bool,
}

/// The running world as seen from the player: feeds input into the player Obj,
/// reacts to arrivals and keeps only the player's current map populated.
pub struct Session {
    world: World,
    player: ObjId,
    current_map: MapId,
}

impl Session {
    pub fn new(world: World, player: ObjId) -> Result<Self, WorldError> {
        let current_map = world
            .obj(player)
            .ok_or(WorldError::UnknownObj(player))?
            .position()
            .map;
        Ok(Self {
            world,
            player,
            current_map,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn player(&self) -> ObjId {
        self.player
    }

    pub fn current_map(&self) -> MapId {
        self.current_map
    }

    pub fn obj_count(&self) -> usize {
        self.world.objs().count()
    }

    pub fn step(&mut self, input: StepInput) -> Result<(), WorldError> {
        if input.toggle_surf {
            self.toggle_surf()?;
        }
        if let Some(direction) = input.direction {
            self.world.move_obj(self.player, direction, input.running)?;
        }

        let arrivals = self.world.tick()?;
        let player = self.player;
        for arrival in arrivals.iter().filter(|arrival| arrival.obj == player) {
            self.on_player_arrival(arrival)?;
        }
        self.sync_current_map()
    }

    pub fn render(&self, frame: &mut Frame) -> Result<(), LoadError> {
        let Some(camera) = self.world.obj(self.player) else {
            return Ok(());
        };
        draw_map(
            frame,
            self.world.registry(),
            camera,
            self.world.objs().map(|(_, obj)| obj),
        )
    }

    fn toggle_surf(&mut self) -> Result<(), WorldError> {
        let player = self
            .world
            .obj_mut(self.player)
            .ok_or(WorldError::UnknownObj(self.player))?;
        let mode = match player.mode() {
            MovementMode::Walking => MovementMode::Surfing,
            MovementMode::Surfing => MovementMode::Walking,
        };
        player.set_mode(mode);
        info!(mode = ?mode, "movement_mode_changed");
        Ok(())
    }

    fn on_player_arrival(&mut self, arrival: &Arrival) -> Result<(), WorldError> {
        let attributes = arrival.behavior.attributes();
        if let Some(kind) = attributes.encounter {
            let map = self.world.registry().map(arrival.position.map)?;
            if let Some(group) = map.encounters().group(kind) {
                debug!(
                    map_id = arrival.position.map,
                    kind = ?kind,
                    entries = group.entries.len(),
                    "encounter_cell_entered"
                );
            }
        }
        if attributes.warp {
            if let Some(warp) = self.world.warp_at(self.player)? {
                self.world.apply_warp(self.player, &warp)?;
            }
        }
        Ok(())
    }

    fn sync_current_map(&mut self) -> Result<(), WorldError> {
        let map = self
            .world
            .obj(self.player)
            .ok_or(WorldError::UnknownObj(self.player))?
            .position()
            .map;
        if map == self.current_map {
            return Ok(());
        }

        let removed = self.world.remove_objs_on_map(self.current_map);
        let spawned = self.world.populate_map_objs(map)?;
        self.world.registry().release_unused();
        info!(
            from_map = self.current_map,
            to_map = map,
            map = self.world.registry().map_name(map).unwrap_or("<unnamed>"),
            removed,
            spawned = spawned.len(),
            "active_map_changed"
        );
        self.current_map = map;
        Ok(())
    }
}
