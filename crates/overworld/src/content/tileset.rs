use std::path::Path;

use image::ImageReader;
use tracing::debug;

use super::error::{invalid_format, LoadError};

pub const TILE_SIZE: u32 = 8;
const TILE_RGBA_LEN: usize = (TILE_SIZE * TILE_SIZE * 4) as usize;

/// One 8x8 RGBA tile, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    rgba: Box<[u8; TILE_RGBA_LEN]>,
}

impl Tile {
    pub fn from_rgba(rgba: [u8; TILE_RGBA_LEN]) -> Self {
        Self {
            rgba: Box::new(rgba),
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * TILE_SIZE + x) * 4) as usize;
        [
            self.rgba[offset],
            self.rgba[offset + 1],
            self.rgba[offset + 2],
            self.rgba[offset + 3],
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tileset {
    id: u32,
    tiles: Vec<Tile>,
}

impl Tileset {
    /// Cuts a PNG sheet into tiles, left to right then top to bottom.
    pub fn load(id: u32, path: &Path) -> Result<Self, LoadError> {
        let reader = ImageReader::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded = reader.decode().map_err(|source| LoadError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        let sheet = decoded.to_rgba8();
        let (width, height) = sheet.dimensions();
        if width == 0 || height == 0 || width % TILE_SIZE != 0 || height % TILE_SIZE != 0 {
            return Err(invalid_format(
                path,
                format!("tileset sheet {width}x{height} is not a multiple of {TILE_SIZE}"),
            ));
        }

        let columns = width / TILE_SIZE;
        let rows = height / TILE_SIZE;
        let mut tiles = Vec::with_capacity((columns * rows) as usize);
        for row in 0..rows {
            for column in 0..columns {
                let mut rgba = [0u8; TILE_RGBA_LEN];
                for py in 0..TILE_SIZE {
                    for px in 0..TILE_SIZE {
                        let pixel = sheet.get_pixel(column * TILE_SIZE + px, row * TILE_SIZE + py);
                        let offset = ((py * TILE_SIZE + px) * 4) as usize;
                        rgba[offset..offset + 4].copy_from_slice(&pixel.0);
                    }
                }
                tiles.push(Tile::from_rgba(rgba));
            }
        }

        debug!(tileset_id = id, tile_count = tiles.len(), "tileset_loaded");
        Ok(Self { id, tiles })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tile(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }
}
