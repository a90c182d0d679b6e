use std::path::Path;
use std::rc::Rc;

use tracing::debug;

use crate::world::Behavior;

use super::cache::ResourceCache;
use super::error::LoadError;
use super::reader::{read_resource_bytes, ByteReader};
use super::tileset::{Tile, Tileset};

/// Elevation layers every block position carries art for. A cell elevation is
/// always below this, so it fits an 8-bit "allowed elevations" mask.
pub const ELEVATION_COUNT: usize = 8;
/// Tile-grid positions per block: top-left, top-right, bottom-left, bottom-right.
pub const BLOCK_TILE_POSITIONS: usize = 4;
pub const BLOCK_SIZE_PX: i32 = 16;

/// Behavior byte plus an empty sub-layer count for every position and elevation.
const MIN_BLOCK_ENCODED_LEN: usize = 1 + BLOCK_TILE_POSITIONS * ELEVATION_COUNT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRef {
    pub tileset: Rc<Tileset>,
    pub index: usize,
    pub x_flip: bool,
    pub y_flip: bool,
}

impl TileRef {
    pub fn tile(&self) -> Option<&Tile> {
        self.tileset.tile(self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    behavior: Behavior,
    layers: [[Vec<TileRef>; ELEVATION_COUNT]; BLOCK_TILE_POSITIONS],
}

impl Block {
    pub fn behavior(&self) -> Behavior {
        self.behavior
    }

    /// Sub-layer stack for one position and elevation, bottom first.
    pub fn tiles(&self, position: usize, elevation: usize) -> &[TileRef] {
        self.layers
            .get(position)
            .and_then(|by_elevation| by_elevation.get(elevation))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blockset {
    id: u32,
    blocks: Vec<Block>,
}

impl Blockset {
    pub fn load(
        id: u32,
        path: &Path,
        tilesets: &ResourceCache<Tileset>,
    ) -> Result<Self, LoadError> {
        let bytes = read_resource_bytes(path)?;
        let mut reader = ByteReader::new(&bytes, path);

        let count = reader.read_u16()? as usize;
        reader.ensure_records(count, MIN_BLOCK_ENCODED_LEN)?;
        let mut blocks = Vec::with_capacity(count);
        for _ in 0..count {
            blocks.push(read_block(&mut reader, tilesets)?);
        }
        reader.expect_end()?;

        debug!(blockset_id = id, block_count = blocks.len(), "blockset_loaded");
        Ok(Self { id, blocks })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Caller guarantees `index < len()`; layout cells validate it on decode.
    pub(crate) fn block_at(&self, index: usize) -> &Block {
        &self.blocks[index]
    }
}

fn read_block(
    reader: &mut ByteReader<'_>,
    tilesets: &ResourceCache<Tileset>,
) -> Result<Block, LoadError> {
    let raw_behavior = reader.read_u8()?;
    let behavior = Behavior::from_u8(raw_behavior)
        .ok_or_else(|| reader.invalid(format!("unknown block behavior {raw_behavior}")))?;

    let mut layers: [[Vec<TileRef>; ELEVATION_COUNT]; BLOCK_TILE_POSITIONS] =
        std::array::from_fn(|_| std::array::from_fn(|_| Vec::new()));
    for by_elevation in layers.iter_mut() {
        for stack in by_elevation.iter_mut() {
            let sub_layer_count = reader.read_u8()?;
            stack.reserve(sub_layer_count as usize);
            for _ in 0..sub_layer_count {
                stack.push(read_tile_ref(reader, tilesets)?);
            }
        }
    }
    Ok(Block { behavior, layers })
}

fn read_tile_ref(
    reader: &mut ByteReader<'_>,
    tilesets: &ResourceCache<Tileset>,
) -> Result<TileRef, LoadError> {
    let x_flip = reader.read_bool()?;
    let y_flip = reader.read_bool()?;
    let tileset_id = tilesets.check_raw_id(reader.read_i32()?)?;
    let raw_index = reader.read_i32()?;
    let tileset = tilesets.load_or_get(tileset_id, |path| Tileset::load(tileset_id, path))?;
    let index = usize::try_from(raw_index)
        .ok()
        .filter(|index| *index < tileset.len())
        .ok_or_else(|| LoadError::InvalidTileIndex {
            path: reader.path().to_path_buf(),
            tileset_id,
            index: raw_index,
            count: tileset.len(),
        })?;
    Ok(TileRef {
        tileset,
        index,
        x_flip,
        y_flip,
    })
}
