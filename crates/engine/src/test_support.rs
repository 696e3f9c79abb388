use std::sync::Arc;

use crate::body::Body;
use crate::geometry::{PixelPoint, TileCoord};
use crate::pixels::{MaskHandle, PixelMask};
use crate::tiles::{TileAtlas, TileCode, TileGrid};

pub(crate) const WALL: TileCode = 35;
pub(crate) const LOW_BARRIER: TileCode = 20;

/// `#` wall, `=` low barrier, `D` door key, `K` main key, `E` exit, anything else floor.
pub(crate) fn grid_from_rows(tile_size: u32, rows: &[&str]) -> TileGrid {
    let height = rows.len() as u32;
    let width = rows.first().map_or(0, |row| row.len()) as u32;
    let atlas = Arc::new(TileAtlas::opaque(tile_size, 129).expect("atlas"));
    let mut grid = TileGrid::filled(width, height, 0, atlas);
    for (y, row) in rows.iter().enumerate() {
        for (x, cell) in row.chars().enumerate() {
            let code = match cell {
                '#' => WALL,
                '=' => LOW_BARRIER,
                'D' => crate::tiles::DOOR_KEY_CODE,
                'K' => crate::tiles::MAIN_KEY_CODE,
                'E' => crate::tiles::PROGRESS_AREA_CODE,
                _ => continue,
            };
            assert!(grid.set_code(TileCoord::new(x as u32, y as u32), code));
        }
    }
    grid
}

pub(crate) fn open_grid(width: u32, height: u32, tile_size: u32) -> TileGrid {
    let atlas = Arc::new(TileAtlas::opaque(tile_size, 129).expect("atlas"));
    TileGrid::filled(width, height, 0, atlas)
}

pub(crate) fn square_body(centre: PixelPoint, size: u32) -> Body {
    Body::new(
        centre,
        MaskHandle::single(PixelMask::filled(size, size)),
        0.5,
        0.5,
    )
}
