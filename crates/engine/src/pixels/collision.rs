use crate::body::Body;
use crate::tiles::{blocks_movement, TileGrid};

/// First pixel of `a`'s draw area where both current frames are drawn.
pub fn objects_collide(a: &Body, b: &Body) -> bool {
    let origin = a.position();
    let width = a.width() as i32;
    let height = a.height() as i32;
    for x in origin.x..origin.x + width {
        for y in origin.y..origin.y + height {
            if a.is_at_location(x, y, false) && b.is_at_location(x, y, false) {
                return true;
            }
        }
    }
    false
}

/// Pixel test behind a bounding-distance pre-filter on the top-left corners.
pub fn bodies_touch(a: &Body, b: &Body) -> bool {
    let distance = a.position().distance_to(b.position()) as u32;
    if distance > a.width() || distance > a.height() {
        return false;
    }
    objects_collide(a, b)
}

/// Would moving `body` by `(dx, dy)` put its default pose over a blocking tile?
/// With `exact` the tile's own graphic must also be drawn at that pixel.
pub fn tile_collision(body: &Body, grid: &TileGrid, dx: i32, dy: i32, exact: bool) -> bool {
    let origin = body.position();
    let left = origin.x + dx;
    let top = origin.y + dy;
    let width = body.width() as i32;
    let height = body.height() as i32;
    for x in left..left + width {
        for y in top..top + height {
            if !body.is_at_location(x - dx, y - dy, true) {
                continue;
            }
            if !blocks_movement(grid.code_at_pixel(x, y)) {
                continue;
            }
            if !exact || grid.tile_pixel_is_set(x, y) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::geometry::{PixelPoint, TileCoord};
    use crate::pixels::{MaskHandle, PixelMask};
    use crate::tiles::TileAtlas;

    const WALL: i32 = 35;

    fn square(centre: PixelPoint, size: u32) -> Body {
        Body::new(
            centre,
            MaskHandle::single(PixelMask::filled(size, size)),
            0.5,
            0.5,
        )
    }

    /// 2x1 grid of 8px tiles with a wall on the right whose graphic only
    /// covers the columns `drawn` allows.
    fn walled_grid(drawn: fn(u32) -> bool) -> TileGrid {
        let mask = PixelMask::from_fn(80, 32, |x, y| {
            (40..48).contains(&x) && (24..32).contains(&y) && drawn(x - 40)
        });
        let atlas = Arc::new(TileAtlas::new(8, 10, mask).expect("atlas"));
        let mut grid = TileGrid::filled(2, 1, 0, atlas);
        assert!(grid.set_code(TileCoord::new(1, 0), WALL));
        grid
    }

    #[test]
    fn overlapping_masks_collide() {
        let a = square(PixelPoint::new(10, 10), 4);
        let b = square(PixelPoint::new(12, 12), 4);
        let far = square(PixelPoint::new(30, 10), 4);
        assert!(objects_collide(&a, &b));
        assert!(bodies_touch(&a, &b));
        assert!(!objects_collide(&a, &far));
        assert!(!bodies_touch(&a, &far));
    }

    #[test]
    fn distance_prefilter_rejects_before_pixel_scan() {
        let a = square(PixelPoint::new(10, 10), 4);
        // Overlapping draw areas, but the corners sit seven pixels apart.
        let b = Body::new(
            PixelPoint::new(7, 7),
            MaskHandle::single(PixelMask::filled(8, 8)),
            0.5,
            0.5,
        );
        assert!(objects_collide(&b, &a));
        assert!(!bodies_touch(&a, &b));
    }

    #[test]
    fn tile_collision_only_checks_prospective_position() {
        let grid = walled_grid(|_| true);
        let body = square(PixelPoint::new(2, 4), 4);
        assert!(!tile_collision(&body, &grid, 3, 0, true));
        assert!(tile_collision(&body, &grid, 5, 0, true));
        assert!(!tile_collision(&body, &grid, 0, 2, true));
    }

    #[test]
    fn exact_collision_needs_category_and_tile_pixel() {
        let left_drawn = walled_grid(|local_x| local_x < 4);
        let right_drawn = walled_grid(|local_x| local_x >= 4);
        let body = square(PixelPoint::new(2, 4), 4);

        assert!(tile_collision(&body, &left_drawn, 5, 0, true));
        assert!(tile_collision(&body, &right_drawn, 5, 0, false));
        assert!(!tile_collision(&body, &right_drawn, 5, 0, true));
        assert!(!tile_collision(&body, &right_drawn, 8, 0, true));
        assert!(tile_collision(&body, &right_drawn, 9, 0, true));
    }

    #[test]
    fn exact_collision_ignores_drawn_walkable_tiles() {
        let atlas = Arc::new(TileAtlas::opaque(8, 129).expect("atlas"));
        let grid = TileGrid::filled(2, 1, 0, atlas);
        let body = square(PixelPoint::new(2, 4), 4);
        assert!(grid.tile_pixel_is_set(12, 4));
        assert!(!tile_collision(&body, &grid, 8, 0, true));
        assert!(!tile_collision(&body, &grid, 8, 0, false));
    }

    #[test]
    fn undrawn_body_pixels_never_collide() {
        let grid = walled_grid(|_| true);
        let hollow = PixelMask::from_fn(4, 4, |x, _| x == 0);
        let body = Body::new(PixelPoint::new(2, 4), MaskHandle::single(hollow), 0.5, 0.5);
        // Only the leftmost column is drawn, so it can slide until that column reaches x = 8.
        assert!(!tile_collision(&body, &grid, 7, 0, true));
        assert!(tile_collision(&body, &grid, 8, 0, true));
    }
}
