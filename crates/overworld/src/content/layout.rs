use std::path::Path;
use std::rc::Rc;

use bitflags::bitflags;
use tracing::debug;

use super::blockset::{Block, Blockset, ELEVATION_COUNT};
use super::cache::ResourceCache;
use super::error::LoadError;
use super::reader::{read_resource_bytes, ByteReader};
use super::tileset::Tileset;

bitflags! {
    /// Per-cell movement gates. The four corner bits allow a diagonal move to
    /// cut through that corner of the cell.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Passage: u8 {
        const SOUTHWEST = 1 << 0;
        const SOUTHEAST = 1 << 1;
        const NORTHWEST = 1 << 2;
        const NORTHEAST = 1 << 3;
        const ALLOW_OCCUPANCY = 1 << 4;
    }
}

/// One layout cell: a shared block plus the cell's own elevation and passage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    blockset: Rc<Blockset>,
    block_index: usize,
    elevation: u8,
    passage: Passage,
}

impl Cell {
    pub fn block(&self) -> &Block {
        self.blockset.block_at(self.block_index)
    }

    pub fn blockset(&self) -> &Rc<Blockset> {
        &self.blockset
    }

    pub fn block_index(&self) -> usize {
        self.block_index
    }

    pub fn elevation(&self) -> u8 {
        self.elevation
    }

    pub fn passage(&self) -> Passage {
        self.passage
    }

    pub fn allows_occupancy(&self) -> bool {
        self.passage.contains(Passage::ALLOW_OCCUPANCY)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl Grid {
    fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get((y * self.width + x) as usize)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    id: u32,
    grid: Grid,
    border: Option<Grid>,
}

impl Layout {
    pub fn load(
        id: u32,
        path: &Path,
        blocksets: &ResourceCache<Blockset>,
        tilesets: &ResourceCache<Tileset>,
    ) -> Result<Self, LoadError> {
        let bytes = read_resource_bytes(path)?;
        let mut reader = ByteReader::new(&bytes, path);

        let width = reader.read_i32()?;
        let height = reader.read_i32()?;
        if width <= 0 || height <= 0 {
            return Err(LoadError::InvalidDimensions {
                path: path.to_path_buf(),
                width,
                height,
            });
        }
        let count = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| reader.invalid(format!("layout {width}x{height} is too large")))?;
        let cells = read_cells(&mut reader, count, blocksets, tilesets)?;

        let border_width = reader.read_u8()?;
        let border_height = reader.read_u8()?;
        let border = if border_width != 0 && border_height != 0 {
            let count = border_width as usize * border_height as usize;
            Some(Grid {
                width: border_width as i32,
                height: border_height as i32,
                cells: read_cells(&mut reader, count, blocksets, tilesets)?,
            })
        } else {
            None
        };
        reader.expect_end()?;

        debug!(
            layout_id = id,
            width,
            height,
            border_width,
            border_height,
            "layout_loaded"
        );
        Ok(Self {
            id,
            grid: Grid {
                width,
                height,
                cells,
            },
            border,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn width(&self) -> i32 {
        self.grid.width
    }

    pub fn height(&self) -> i32 {
        self.grid.height
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        self.grid.get(x, y)
    }

    pub fn has_border(&self) -> bool {
        self.border.is_some()
    }

    /// Border cell for an arbitrary coordinate; the border pattern repeats in
    /// both axes, including toward negative coordinates.
    pub fn border_cell(&self, x: i32, y: i32) -> Option<&Cell> {
        let border = self.border.as_ref()?;
        border.get(x.rem_euclid(border.width), y.rem_euclid(border.height))
    }
}

/// elevation:u8, passage:u8, blockset:i32, block:i32
const CELL_ENCODED_LEN: usize = 10;

fn read_cells(
    reader: &mut ByteReader<'_>,
    count: usize,
    blocksets: &ResourceCache<Blockset>,
    tilesets: &ResourceCache<Tileset>,
) -> Result<Vec<Cell>, LoadError> {
    reader.ensure_records(count, CELL_ENCODED_LEN)?;
    let mut cells = Vec::with_capacity(count);
    for _ in 0..count {
        let elevation = reader.read_u8()?;
        if elevation as usize >= ELEVATION_COUNT {
            return Err(reader.invalid(format!("cell elevation {elevation} out of range")));
        }
        let raw_passage = reader.read_u8()?;
        let passage = Passage::from_bits(raw_passage)
            .ok_or_else(|| reader.invalid(format!("unknown passage bits {raw_passage:#04x}")))?;
        let blockset_id = blocksets.check_raw_id(reader.read_i32()?)?;
        let raw_block_index = reader.read_i32()?;
        let blockset = blocksets.load_or_get(blockset_id, |path| {
            Blockset::load(blockset_id, path, tilesets)
        })?;
        let block_index = usize::try_from(raw_block_index)
            .ok()
            .filter(|index| *index < blockset.len())
            .ok_or_else(|| LoadError::InvalidBlockIndex {
                path: reader.path().to_path_buf(),
                blockset_id,
                index: raw_block_index,
                count: blockset.len(),
            })?;
        cells.push(Cell {
            blockset,
            block_index,
            elevation,
            passage,
        });
    }
    Ok(cells)
}
