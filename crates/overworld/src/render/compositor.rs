use crate::content::{
    LoadError, Tile, TileRef, BLOCK_SIZE_PX, BLOCK_TILE_POSITIONS, ELEVATION_COUNT, TILE_SIZE,
};
use crate::world::{Obj, Registry, ResolvedCell};

use super::frame::{Frame, VOID_COLOR};

/// Extra blocks resolved past each screen edge so a scrolling camera never
/// exposes an undrawn strip.
const VIEW_PADDING_BLOCKS: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRange {
    x_min: i32,
    x_max: i32,
    y_min: i32,
    y_max: i32,
}

/// Screen position of cell `(0, 0)` of the camera's map.
fn camera_origin_px(frame: &Frame, camera: &Obj) -> (i32, i32) {
    let position = camera.position();
    let (offset_x, offset_y) = camera.pixel_offset();
    let half_block = BLOCK_SIZE_PX / 2;
    (
        frame.width() as i32 / 2 - half_block - (position.x * BLOCK_SIZE_PX + offset_x),
        frame.height() as i32 / 2 - half_block - (position.y * BLOCK_SIZE_PX + offset_y),
    )
}

fn visible_cell_range(frame: &Frame, origin: (i32, i32)) -> CellRange {
    CellRange {
        x_min: (-origin.0).div_euclid(BLOCK_SIZE_PX) - VIEW_PADDING_BLOCKS,
        x_max: (frame.width() as i32 - 1 - origin.0).div_euclid(BLOCK_SIZE_PX)
            + VIEW_PADDING_BLOCKS,
        y_min: (-origin.1).div_euclid(BLOCK_SIZE_PX) - VIEW_PADDING_BLOCKS,
        y_max: (frame.height() as i32 - 1 - origin.1).div_euclid(BLOCK_SIZE_PX)
            + VIEW_PADDING_BLOCKS,
    }
}

/// Composites the camera's map into `frame`, one elevation at a time from the
/// ground up. After each elevation's terrain, the Objs standing on that
/// elevation are drawn, so higher terrain (bridges, roofs) covers them.
///
/// Only Objs on the camera's own map are drawn; Objs on connected maps stay
/// invisible even when their cells are on screen.
pub fn draw_map<'a>(
    frame: &mut Frame,
    registry: &Registry,
    camera: &Obj,
    objs: impl IntoIterator<Item = &'a Obj>,
) -> Result<(), LoadError> {
    frame.clear(VOID_COLOR);
    let map = camera.position().map;
    let origin = camera_origin_px(frame, camera);
    let range = visible_cell_range(frame, origin);

    let mut cells: Vec<(i32, i32, ResolvedCell)> = Vec::new();
    for y in range.y_min..=range.y_max {
        for x in range.x_min..=range.x_max {
            if let Some(resolved) = registry.get_block(map, x, y)? {
                cells.push((x, y, resolved));
            }
        }
    }
    let objs: Vec<&Obj> = objs
        .into_iter()
        .filter(|obj| obj.position().map == map)
        .collect();

    for elevation in 0..ELEVATION_COUNT {
        for (x, y, resolved) in &cells {
            let left = origin.0 + x * BLOCK_SIZE_PX;
            let top = origin.1 + y * BLOCK_SIZE_PX;
            let block = resolved.cell.block();
            for position in 0..BLOCK_TILE_POSITIONS {
                let tile_left = left + (position % 2) as i32 * TILE_SIZE as i32;
                let tile_top = top + (position / 2) as i32 * TILE_SIZE as i32;
                for tile_ref in block.tiles(position, elevation) {
                    draw_tile_ref(frame, tile_ref, tile_left, tile_top);
                }
            }
        }

        for obj in objs
            .iter()
            .filter(|obj| obj.position().elevation as usize == elevation)
        {
            let position = obj.position();
            let (offset_x, offset_y) = obj.pixel_offset();
            let [r, g, b] = obj.color();
            frame.draw_square(
                origin.0 + position.x * BLOCK_SIZE_PX + offset_x,
                origin.1 + position.y * BLOCK_SIZE_PX + offset_y,
                BLOCK_SIZE_PX,
                [r, g, b, 255],
            );
        }
    }
    Ok(())
}

fn draw_tile_ref(frame: &mut Frame, tile_ref: &TileRef, left: i32, top: i32) {
    if let Some(tile) = tile_ref.tile() {
        draw_tile(frame, tile, left, top, tile_ref.x_flip, tile_ref.y_flip);
    }
}

fn draw_tile(frame: &mut Frame, tile: &Tile, left: i32, top: i32, x_flip: bool, y_flip: bool) {
    let last = TILE_SIZE - 1;
    for ty in 0..TILE_SIZE {
        for tx in 0..TILE_SIZE {
            let sx = if x_flip { last - tx } else { tx };
            let sy = if y_flip { last - ty } else { ty };
            let [r, g, b, a] = tile.pixel(sx, sy);
            if a == 0 {
                continue;
            }
            frame.write_pixel_rgba_clipped(left + tx as i32, top + ty as i32, [r, g, b, 255]);
        }
    }
}
