mod blockset;
mod cache;
mod error;
mod id_list;
mod layout;
mod map;
mod reader;
mod tileset;

pub use blockset::{
    Block, Blockset, TileRef, BLOCK_SIZE_PX, BLOCK_TILE_POSITIONS, ELEVATION_COUNT,
};
pub use cache::{CacheStats, ResourceCache};
pub use error::{LoadError, ResourceKind};
pub use id_list::IdList;
pub use layout::{Cell, Layout, Passage};
pub use map::{
    Connection, ConnectionDirection, Encounter, EncounterGroup, EncounterKind, EncounterTable,
    Map, MapDetails, MapEvents, MapFlags, MapId, ObjEvent, ObjMovement, Warp, Weather,
};
pub(crate) use map::MapSources;
pub use tileset::{Tile, Tileset, TILE_SIZE};
