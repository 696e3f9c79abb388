use std::sync::Arc;

use thiserror::Error;

use crate::geometry::{PixelPoint, TileCoord};
use crate::pixels::PixelMask;

use super::codes::{TileCode, WALKABLE_CODE};

pub const DEFAULT_ATLAS_COLUMNS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("tile size must be non-zero")]
    ZeroTileSize,
    #[error("atlas columns must be non-zero")]
    ZeroAtlasColumns,
}

/// Mask of the tile sheet: tile `code` is drawn at
/// `((code % columns) * size, (code / columns) * size)`.
#[derive(Debug, Clone)]
pub struct TileAtlas {
    tile_size: u32,
    columns: u32,
    mask: PixelMask,
}

impl TileAtlas {
    pub fn new(tile_size: u32, columns: u32, mask: PixelMask) -> Result<Self, GridError> {
        if tile_size == 0 {
            return Err(GridError::ZeroTileSize);
        }
        if columns == 0 {
            return Err(GridError::ZeroAtlasColumns);
        }
        Ok(Self {
            tile_size,
            columns,
            mask,
        })
    }

    /// Every tile fully opaque up to `max_code`.
    pub fn opaque(tile_size: u32, max_code: TileCode) -> Result<Self, GridError> {
        let columns = DEFAULT_ATLAS_COLUMNS;
        let rows = max_code.max(0) as u32 / columns + 1;
        let mask = PixelMask::filled(columns * tile_size, rows * tile_size);
        Self::new(tile_size, columns, mask)
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn mask(&self) -> &PixelMask {
        &self.mask
    }

    pub fn pixel_set(&self, code: TileCode, local_x: u32, local_y: u32) -> bool {
        if code < 0 || local_x >= self.tile_size || local_y >= self.tile_size {
            return false;
        }
        let code = code as u32;
        let image_x = (code % self.columns) * self.tile_size + local_x;
        let image_y = (code / self.columns) * self.tile_size + local_y;
        match (i32::try_from(image_x), i32::try_from(image_y)) {
            (Ok(x), Ok(y)) => self.mask.is_set(x, y),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TileGrid {
    width: u32,
    height: u32,
    codes: Vec<TileCode>,
    atlas: Arc<TileAtlas>,
}

impl TileGrid {
    pub fn new(
        width: u32,
        height: u32,
        codes: Vec<TileCode>,
        atlas: Arc<TileAtlas>,
    ) -> Result<Self, GridError> {
        let expected = width as usize * height as usize;
        let actual = codes.len();
        if expected != actual {
            return Err(GridError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            codes,
            atlas,
        })
    }

    pub fn filled(width: u32, height: u32, code: TileCode, atlas: Arc<TileAtlas>) -> Self {
        Self {
            width,
            height,
            codes: vec![code; width as usize * height as usize],
            atlas,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> u32 {
        self.atlas.tile_size()
    }

    pub fn atlas(&self) -> &Arc<TileAtlas> {
        &self.atlas
    }

    pub fn pixel_width(&self) -> i32 {
        (self.width * self.tile_size()) as i32
    }

    pub fn pixel_height(&self) -> i32 {
        (self.height * self.tile_size()) as i32
    }

    pub fn index_of(&self, tile: TileCoord) -> Option<usize> {
        if tile.x >= self.width || tile.y >= self.height {
            return None;
        }
        Some(tile.y as usize * self.width as usize + tile.x as usize)
    }

    pub fn code_at(&self, tile: TileCoord) -> Option<TileCode> {
        self.index_of(tile)
            .and_then(|index| self.codes.get(index).copied())
    }

    pub fn tile_of_pixel(&self, x: i32, y: i32) -> Option<TileCoord> {
        if x < 0 || y < 0 {
            return None;
        }
        let size = self.tile_size() as i32;
        let tile = TileCoord::new((x / size) as u32, (y / size) as u32);
        self.index_of(tile).map(|_| tile)
    }

    /// Off-map pixels read as plain floor.
    pub fn code_at_pixel(&self, x: i32, y: i32) -> TileCode {
        self.tile_of_pixel(x, y)
            .and_then(|tile| self.code_at(tile))
            .unwrap_or(WALKABLE_CODE)
    }

    /// Whether the tile graphic under this world pixel is drawn there.
    pub fn tile_pixel_is_set(&self, x: i32, y: i32) -> bool {
        let Some(tile) = self.tile_of_pixel(x, y) else {
            return false;
        };
        let Some(code) = self.code_at(tile) else {
            return false;
        };
        let size = self.tile_size() as i32;
        self.atlas
            .pixel_set(code, x.rem_euclid(size) as u32, y.rem_euclid(size) as u32)
    }

    pub fn tile_centre(&self, tile: TileCoord) -> PixelPoint {
        let size = self.tile_size() as i32;
        PixelPoint::new(
            tile.x as i32 * size + size / 2,
            tile.y as i32 * size + size / 2,
        )
    }

    pub(crate) fn set_code(&mut self, tile: TileCoord, code: TileCode) -> bool {
        let Some(index) = self.index_of(tile) else {
            return false;
        };
        self.codes[index] = code;
        true
    }

    pub fn tiles(&self) -> impl Iterator<Item = (TileCoord, TileCode)> + '_ {
        let width = self.width.max(1);
        self.codes.iter().enumerate().map(move |(index, code)| {
            let index = index as u32;
            (TileCoord::new(index % width, index / width), *code)
        })
    }
}
