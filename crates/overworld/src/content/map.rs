use std::path::Path;
use std::rc::Rc;

use bitflags::bitflags;
use tracing::debug;

use super::blockset::{Blockset, ELEVATION_COUNT};
use super::cache::ResourceCache;
use super::error::LoadError;
use super::layout::Layout;
use super::reader::{read_resource_bytes, ByteReader};
use super::tileset::Tileset;

pub type MapId = u32;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MapFlags: u8 {
        const DAY_TINT = 1 << 0;
        const BIKE = 1 << 1;
        const FLY = 1 << 2;
        const TELEPORT = 1 << 3;
        const DIG = 1 << 4;
        const ESCAPE_ROPE = 1 << 5;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Weather {
    #[default]
    None,
    Rain,
    Thunderstorm,
    Snow,
    Sandstorm,
    Fog,
    Drought,
}

impl Weather {
    fn from_u8(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => Weather::None,
            1 => Weather::Rain,
            2 => Weather::Thunderstorm,
            3 => Weather::Snow,
            4 => Weather::Sandstorm,
            5 => Weather::Fog,
            6 => Weather::Drought,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapDetails {
    pub flags: MapFlags,
    pub section: u8,
    pub weather: Weather,
    pub music: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Warp {
    pub x: i32,
    pub y: i32,
    pub elevation: u8,
    pub dest_map: MapId,
    pub dest_x: i32,
    pub dest_y: i32,
    pub dest_elevation: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjMovement {
    Still,
    LookAround,
    Wander,
}

/// NPC spawn declared by the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjEvent {
    pub x: i32,
    pub y: i32,
    pub elevation: u8,
    pub id: u16,
    pub movement: ObjMovement,
    pub color: [u8; 3],
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MapEvents {
    pub warps: Vec<Warp>,
    pub objs: Vec<ObjEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncounterKind {
    Default,
    DarkGrass,
    Surf,
    Special,
    OldRod,
    GoodRod,
    SuperRod,
}

impl EncounterKind {
    fn from_u8(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => EncounterKind::Default,
            1 => EncounterKind::DarkGrass,
            2 => EncounterKind::Surf,
            3 => EncounterKind::Special,
            4 => EncounterKind::OldRod,
            5 => EncounterKind::GoodRod,
            6 => EncounterKind::SuperRod,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encounter {
    pub chance: u8,
    pub min_level: u8,
    pub max_level: u8,
    pub species: u16,
    pub form: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncounterGroup {
    pub kind: EncounterKind,
    /// Per-step odds out of 255 that an encounter starts at all.
    pub chance_of_phenomenon: u8,
    pub entries: Vec<Encounter>,
}

impl EncounterGroup {
    pub fn total_chance(&self) -> u32 {
        self.entries.iter().map(|entry| entry.chance as u32).sum()
    }

    /// Picks the entry whose cumulative chance window contains `roll` taken
    /// modulo the total weight. The caller owns the randomness.
    pub fn pick(&self, roll: u32) -> Option<&Encounter> {
        let total = self.total_chance();
        if total == 0 {
            return None;
        }
        let mut remaining = roll % total;
        for entry in &self.entries {
            let chance = entry.chance as u32;
            if remaining < chance {
                return Some(entry);
            }
            remaining -= chance;
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncounterTable {
    pub groups: Vec<EncounterGroup>,
}

impl EncounterTable {
    pub fn group(&self, kind: EncounterKind) -> Option<&EncounterGroup> {
        self.groups.iter().find(|group| group.kind == kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionDirection {
    South,
    North,
    West,
    East,
}

impl ConnectionDirection {
    fn from_u8(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => ConnectionDirection::South,
            1 => ConnectionDirection::North,
            2 => ConnectionDirection::West,
            3 => ConnectionDirection::East,
            _ => return None,
        })
    }
}

/// Positions past `direction`'s edge belong to `map`, shifted along the edge
/// by `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub direction: ConnectionDirection,
    pub map: MapId,
    pub offset: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Map {
    id: MapId,
    layout: Rc<Layout>,
    details: MapDetails,
    events: MapEvents,
    encounters: EncounterTable,
    connections: Vec<Connection>,
}

pub(crate) struct MapSources<'a> {
    pub maps: &'a ResourceCache<Map>,
    pub layouts: &'a ResourceCache<Layout>,
    pub blocksets: &'a ResourceCache<Blockset>,
    pub tilesets: &'a ResourceCache<Tileset>,
}

impl Map {
    pub(crate) fn load(
        id: MapId,
        path: &Path,
        sources: &MapSources<'_>,
    ) -> Result<Self, LoadError> {
        let bytes = read_resource_bytes(path)?;
        let mut reader = ByteReader::new(&bytes, path);

        let layout_id = sources.layouts.check_raw_id(reader.read_i32()?)?;
        let details = read_details(&mut reader)?;
        let warps = read_warps(&mut reader, sources.maps)?;
        let encounters = read_encounters(&mut reader)?;
        let connections = read_connections(&mut reader, sources.maps)?;
        let objs = if reader.is_at_end() {
            Vec::new()
        } else {
            read_obj_events(&mut reader)?
        };
        reader.expect_end()?;

        let layout = sources.layouts.load_or_get(layout_id, |layout_path| {
            Layout::load(layout_id, layout_path, sources.blocksets, sources.tilesets)
        })?;

        debug!(
            map_id = id,
            layout_id,
            warp_count = warps.len(),
            obj_count = objs.len(),
            connection_count = connections.len(),
            "map_loaded"
        );
        Ok(Self {
            id,
            layout,
            details,
            events: MapEvents { warps, objs },
            encounters,
            connections,
        })
    }

    pub fn id(&self) -> MapId {
        self.id
    }

    pub fn layout(&self) -> &Rc<Layout> {
        &self.layout
    }

    pub fn details(&self) -> &MapDetails {
        &self.details
    }

    pub fn events(&self) -> &MapEvents {
        &self.events
    }

    pub fn encounters(&self) -> &EncounterTable {
        &self.encounters
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn warp_at(&self, x: i32, y: i32, elevation: u8) -> Option<&Warp> {
        self.events
            .warps
            .iter()
            .find(|warp| warp.x == x && warp.y == y && warp.elevation == elevation)
    }
}

fn read_details(reader: &mut ByteReader<'_>) -> Result<MapDetails, LoadError> {
    let raw_flags = reader.read_u8()?;
    let flags = MapFlags::from_bits(raw_flags)
        .ok_or_else(|| reader.invalid(format!("unknown map flags {raw_flags:#04x}")))?;
    let section = reader.read_u8()?;
    let raw_weather = reader.read_u8()?;
    let weather = Weather::from_u8(raw_weather)
        .ok_or_else(|| reader.invalid(format!("unknown weather {raw_weather}")))?;
    let music = reader.read_u16()?;
    Ok(MapDetails {
        flags,
        section,
        weather,
        music,
    })
}

fn read_elevation(reader: &mut ByteReader<'_>) -> Result<u8, LoadError> {
    let elevation = reader.read_u8()?;
    if elevation as usize >= ELEVATION_COUNT {
        return Err(reader.invalid(format!("elevation {elevation} out of range")));
    }
    Ok(elevation)
}

fn read_warps(
    reader: &mut ByteReader<'_>,
    maps: &ResourceCache<Map>,
) -> Result<Vec<Warp>, LoadError> {
    let count = reader.read_u16()? as usize;
    let mut warps = Vec::with_capacity(count);
    for _ in 0..count {
        let x = reader.read_i32()?;
        let y = reader.read_i32()?;
        let elevation = read_elevation(reader)?;
        let dest_map = maps.check_raw_id(reader.read_i32()?)?;
        let dest_x = reader.read_i32()?;
        let dest_y = reader.read_i32()?;
        let dest_elevation = read_elevation(reader)?;
        warps.push(Warp {
            x,
            y,
            elevation,
            dest_map,
            dest_x,
            dest_y,
            dest_elevation,
        });
    }
    Ok(warps)
}

fn read_encounters(reader: &mut ByteReader<'_>) -> Result<EncounterTable, LoadError> {
    let group_count = reader.read_u8()? as usize;
    let mut groups = Vec::<EncounterGroup>::with_capacity(group_count);
    for _ in 0..group_count {
        let raw_kind = reader.read_u8()?;
        let kind = EncounterKind::from_u8(raw_kind)
            .ok_or_else(|| reader.invalid(format!("unknown encounter kind {raw_kind}")))?;
        if groups.iter().any(|group| group.kind == kind) {
            return Err(reader.invalid(format!("duplicate encounter group {kind:?}")));
        }
        let chance_of_phenomenon = reader.read_u8()?;
        let entry_count = reader.read_u8()? as usize;
        let mut entries = Vec::with_capacity(entry_count);
        for _ in 0..entry_count {
            let chance = reader.read_u8()?;
            let min_level = reader.read_u8()?;
            let max_level = reader.read_u8()?;
            let species = reader.read_u16()?;
            let form = reader.read_u8()?;
            if min_level > max_level {
                return Err(reader.invalid(format!(
                    "encounter level range {min_level}..{max_level} is inverted"
                )));
            }
            entries.push(Encounter {
                chance,
                min_level,
                max_level,
                species,
                form,
            });
        }
        groups.push(EncounterGroup {
            kind,
            chance_of_phenomenon,
            entries,
        });
    }
    Ok(EncounterTable { groups })
}

fn read_connections(
    reader: &mut ByteReader<'_>,
    maps: &ResourceCache<Map>,
) -> Result<Vec<Connection>, LoadError> {
    let count = reader.read_u8()? as usize;
    let mut connections = Vec::with_capacity(count);
    for _ in 0..count {
        let raw_direction = reader.read_u8()?;
        let direction = ConnectionDirection::from_u8(raw_direction).ok_or_else(|| {
            reader.invalid(format!("unknown connection direction {raw_direction}"))
        })?;
        let map = maps.check_raw_id(reader.read_i32()?)?;
        let offset = reader.read_i32()?;
        connections.push(Connection {
            direction,
            map,
            offset,
        });
    }
    Ok(connections)
}

fn read_obj_events(reader: &mut ByteReader<'_>) -> Result<Vec<ObjEvent>, LoadError> {
    let count = reader.read_u16()? as usize;
    let mut objs = Vec::with_capacity(count);
    for _ in 0..count {
        let x = reader.read_i32()?;
        let y = reader.read_i32()?;
        let elevation = read_elevation(reader)?;
        let id = reader.read_u16()?;
        let raw_movement = reader.read_u8()?;
        let movement = match raw_movement {
            0 => ObjMovement::Still,
            1 => ObjMovement::LookAround,
            2 => ObjMovement::Wander,
            other => return Err(reader.invalid(format!("unknown obj movement {other}"))),
        };
        let color = [reader.read_u8()?, reader.read_u8()?, reader.read_u8()?];
        objs.push(ObjEvent {
            x,
            y,
            elevation,
            id,
            movement,
            color,
        });
    }
    Ok(objs)
}
