//! Fixture writers that encode resources in their on-disk formats, so every
//! loader test goes through real files.

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use tempfile::TempDir;

use crate::config::{AssetDirs, CacheCapacities};
use crate::content::{
    Connection, ConnectionDirection, EncounterTable, MapDetails, MapId, ObjEvent, Passage, Warp,
    BLOCK_TILE_POSITIONS, ELEVATION_COUNT, TILE_SIZE,
};
use crate::world::{Behavior, Registry};

/// Writes a PNG sheet `columns` tiles wide. Tile `i` is filled with
/// `colors[i]`; unused grid slots stay transparent.
pub(crate) fn write_tileset_png(path: &Path, columns: u32, colors: &[[u8; 4]]) {
    let columns = columns.max(1);
    let rows = (colors.len() as u32).div_ceil(columns).max(1);
    let mut sheet = RgbaImage::new(columns * TILE_SIZE, rows * TILE_SIZE);
    for (index, color) in colors.iter().enumerate() {
        let left = (index as u32 % columns) * TILE_SIZE;
        let top = (index as u32 / columns) * TILE_SIZE;
        for y in 0..TILE_SIZE {
            for x in 0..TILE_SIZE {
                sheet.put_pixel(left + x, top + y, Rgba(*color));
            }
        }
    }
    sheet.save(path).expect("write tileset png");
}

#[derive(Debug, Clone, Copy)]
struct TileSpec {
    position: usize,
    elevation: usize,
    tileset: u32,
    index: i32,
    x_flip: bool,
    y_flip: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct BlockSpec {
    behavior: Behavior,
    tiles: Vec<TileSpec>,
}

impl BlockSpec {
    pub(crate) fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            tiles: Vec::new(),
        }
    }

    pub(crate) fn with_tile(
        mut self,
        position: usize,
        elevation: usize,
        tileset: u32,
        index: i32,
        x_flip: bool,
        y_flip: bool,
    ) -> Self {
        self.tiles.push(TileSpec {
            position,
            elevation,
            tileset,
            index,
            x_flip,
            y_flip,
        });
        self
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.behavior as u8);
        for position in 0..BLOCK_TILE_POSITIONS {
            for elevation in 0..ELEVATION_COUNT {
                let stack: Vec<&TileSpec> = self
                    .tiles
                    .iter()
                    .filter(|t| t.position == position && t.elevation == elevation)
                    .collect();
                out.push(stack.len() as u8);
                for tile in stack {
                    out.push(tile.x_flip as u8);
                    out.push(tile.y_flip as u8);
                    out.extend_from_slice(&(tile.tileset as i32).to_le_bytes());
                    out.extend_from_slice(&tile.index.to_le_bytes());
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct CellSpec {
    blockset: u32,
    block_index: i32,
    elevation: u8,
    passage: Passage,
}

impl CellSpec {
    pub(crate) fn new(blockset: u32, block_index: i32, elevation: u8, passage: Passage) -> Self {
        Self {
            blockset,
            block_index,
            elevation,
            passage,
        }
    }

    /// Elevation 0, every passage bit set.
    pub(crate) fn open(blockset: u32, block_index: i32) -> Self {
        Self::new(blockset, block_index, 0, Passage::all())
    }

    /// Open cell on a blockset from `AssetWriter::behavior_blockset`.
    pub(crate) fn behavior(blockset: u32, behavior: Behavior) -> Self {
        Self::open(blockset, behavior as i32)
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.elevation);
        out.push(self.passage.bits());
        out.extend_from_slice(&(self.blockset as i32).to_le_bytes());
        out.extend_from_slice(&self.block_index.to_le_bytes());
    }
}

#[derive(Debug, Clone)]
pub(crate) struct LayoutSpec {
    width: i32,
    height: i32,
    cells: Vec<CellSpec>,
    pub(crate) border: Option<Box<LayoutSpec>>,
}

impl LayoutSpec {
    pub(crate) fn filled(width: i32, height: i32, cell: CellSpec) -> Self {
        Self {
            width,
            height,
            cells: vec![cell; (width * height) as usize],
            border: None,
        }
    }

    pub(crate) fn set(&mut self, x: usize, y: usize, cell: CellSpec) {
        self.cells[y * self.width as usize + x] = cell;
    }

    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        for cell in &self.cells {
            cell.encode(&mut out);
        }
        match &self.border {
            Some(border) => {
                out.push(border.width as u8);
                out.push(border.height as u8);
                for cell in &border.cells {
                    cell.encode(&mut out);
                }
            }
            None => out.extend_from_slice(&[0, 0]),
        }
        out
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MapSpec {
    layout: u32,
    pub(crate) details: MapDetails,
    pub(crate) warps: Vec<Warp>,
    pub(crate) encounters: EncounterTable,
    pub(crate) connections: Vec<Connection>,
    pub(crate) objs: Vec<ObjEvent>,
}

impl MapSpec {
    pub(crate) fn new(layout: u32) -> Self {
        Self {
            layout,
            details: MapDetails::default(),
            warps: Vec::new(),
            encounters: EncounterTable::default(),
            connections: Vec::new(),
            objs: Vec::new(),
        }
    }

    pub(crate) fn connect(&mut self, direction: ConnectionDirection, map: MapId, offset: i32) {
        self.connections.push(Connection {
            direction,
            map,
            offset,
        });
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(self.layout as i32).to_le_bytes());

        out.push(self.details.flags.bits());
        out.push(self.details.section);
        out.push(self.details.weather as u8);
        out.extend_from_slice(&self.details.music.to_le_bytes());

        out.extend_from_slice(&(self.warps.len() as u16).to_le_bytes());
        for warp in &self.warps {
            out.extend_from_slice(&warp.x.to_le_bytes());
            out.extend_from_slice(&warp.y.to_le_bytes());
            out.push(warp.elevation);
            out.extend_from_slice(&(warp.dest_map as i32).to_le_bytes());
            out.extend_from_slice(&warp.dest_x.to_le_bytes());
            out.extend_from_slice(&warp.dest_y.to_le_bytes());
            out.push(warp.dest_elevation);
        }

        out.push(self.encounters.groups.len() as u8);
        for group in &self.encounters.groups {
            out.push(group.kind as u8);
            out.push(group.chance_of_phenomenon);
            out.push(group.entries.len() as u8);
            for entry in &group.entries {
                out.push(entry.chance);
                out.push(entry.min_level);
                out.push(entry.max_level);
                out.extend_from_slice(&entry.species.to_le_bytes());
                out.push(entry.form);
            }
        }

        out.push(self.connections.len() as u8);
        for connection in &self.connections {
            out.push(connection.direction as u8);
            out.extend_from_slice(&(connection.map as i32).to_le_bytes());
            out.extend_from_slice(&connection.offset.to_le_bytes());
        }

        if !self.objs.is_empty() {
            out.extend_from_slice(&(self.objs.len() as u16).to_le_bytes());
            for obj in &self.objs {
                out.extend_from_slice(&obj.x.to_le_bytes());
                out.extend_from_slice(&obj.y.to_le_bytes());
                out.push(obj.elevation);
                out.extend_from_slice(&obj.id.to_le_bytes());
                out.push(obj.movement as u8);
                out.extend_from_slice(&obj.color);
            }
        }
        out
    }
}

/// Builds an asset tree under `root` laid out like `AssetDirs::default()`.
/// Ids are handed out in creation order per kind.
pub(crate) struct AssetWriter {
    root: PathBuf,
    dirs: AssetDirs,
    tilesets: Vec<String>,
    blocksets: Vec<String>,
    layouts: Vec<String>,
    maps: Vec<String>,
}

impl AssetWriter {
    pub(crate) fn new(root: &Path) -> Self {
        let dirs = AssetDirs::default();
        for kind in [&dirs.tilesets, &dirs.blocksets, &dirs.layouts, &dirs.maps] {
            fs::create_dir_all(root.join(&kind.dir)).expect("create asset dir");
        }
        Self {
            root: root.to_path_buf(),
            dirs,
            tilesets: Vec::new(),
            blocksets: Vec::new(),
            layouts: Vec::new(),
            maps: Vec::new(),
        }
    }

    pub(crate) fn tileset(&mut self, name: &str, colors: &[[u8; 4]]) -> u32 {
        let path = self.root.join(&self.dirs.tilesets.dir).join(format!("{name}.png"));
        write_tileset_png(&path, colors.len() as u32, colors);
        push_name(&mut self.tilesets, name)
    }

    pub(crate) fn blockset(&mut self, name: &str, blocks: &[BlockSpec]) -> u32 {
        let mut bytes = (blocks.len() as u16).to_le_bytes().to_vec();
        for block in blocks {
            block.encode(&mut bytes);
        }
        self.raw_blockset(name, &bytes)
    }

    pub(crate) fn raw_blockset(&mut self, name: &str, bytes: &[u8]) -> u32 {
        let path = self
            .root
            .join(&self.dirs.blocksets.dir)
            .join(format!("{name}.pgeblockset"));
        fs::write(path, bytes).expect("write blockset");
        push_name(&mut self.blocksets, name)
    }

    /// One opaque tile and one plain block with no behavior.
    pub(crate) fn plain_blockset(&mut self) -> u32 {
        let tileset = self.tileset("plain", &[[90, 160, 90, 255]]);
        self.blockset(
            "plain",
            &[BlockSpec::new(Behavior::None).with_tile(0, 0, tileset, 0, false, false)],
        )
    }

    /// One art-less block per behavior, so block index == behavior tag.
    pub(crate) fn behavior_blockset(&mut self) -> u32 {
        let blocks: Vec<BlockSpec> = (0..=u8::MAX)
            .map_while(Behavior::from_u8)
            .map(BlockSpec::new)
            .collect();
        self.blockset("behaviors", &blocks)
    }

    pub(crate) fn layout(&mut self, name: &str, fixture: &LayoutSpec) -> u32 {
        self.raw_layout(name, &fixture.encode())
    }

    pub(crate) fn raw_layout(&mut self, name: &str, bytes: &[u8]) -> u32 {
        let path = self
            .root
            .join(&self.dirs.layouts.dir)
            .join(format!("{name}.pgelayout"));
        fs::write(path, bytes).expect("write layout");
        push_name(&mut self.layouts, name)
    }

    pub(crate) fn map(&mut self, name: &str, fixture: &MapSpec) -> MapId {
        let path = self.root.join(&self.dirs.maps.dir).join(format!("{name}.pgemap"));
        fs::write(path, fixture.encode()).expect("write map");
        push_name(&mut self.maps, name)
    }

    /// Writes the id lists and opens a registry over everything written so far.
    pub(crate) fn registry(&self) -> Registry {
        let lists = [
            (&self.dirs.tilesets.id_list, &self.tilesets),
            (&self.dirs.blocksets.id_list, &self.blocksets),
            (&self.dirs.layouts.id_list, &self.layouts),
            (&self.dirs.maps.id_list, &self.maps),
        ];
        for (file, names) in lists {
            let mut text = names.join("\n");
            if !text.is_empty() {
                text.push('\n');
            }
            fs::write(self.root.join(file), text).expect("write id list");
        }
        Registry::open(&self.root, &self.dirs, &CacheCapacities::default()).expect("open registry")
    }
}

fn push_name(names: &mut Vec<String>, name: &str) -> u32 {
    names.push(name.to_string());
    (names.len() - 1) as u32
}

pub(crate) struct TestMap {
    _temp: TempDir,
    pub(crate) registry: Registry,
    pub(crate) map: MapId,
}

/// A single `width`x`height` map over the behavior blockset, every cell open
/// ground until `edit` changes it.
pub(crate) fn behavior_map(
    width: i32,
    height: i32,
    edit: impl FnOnce(&mut LayoutSpec, u32),
) -> TestMap {
    let temp = TempDir::new().expect("temp");
    let mut assets = AssetWriter::new(temp.path());
    let blockset = assets.behavior_blockset();
    let mut layout = LayoutSpec::filled(width, height, CellSpec::open(blockset, 0));
    edit(&mut layout, blockset);
    let layout_id = assets.layout("board", &layout);
    let map = assets.map("Board", &MapSpec::new(layout_id));
    TestMap {
        registry: assets.registry(),
        _temp: temp,
        map,
    }
}
