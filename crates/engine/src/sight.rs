use crate::agent::AgentId;
use crate::body::{Body, Viewport};
use crate::geometry::PixelPoint;
use crate::tiles::{blocks_sight, TileGrid};

/// Whether a straight line from `from` to `to` crosses no sight-blocking
/// tile. Samples every `step` pixels up to and including `to` and ignores the
/// tile graphics, so any overlap with a wall tile blocks.
pub fn line_of_sight(grid: &TileGrid, from: PixelPoint, to: PixelPoint, step: i32) -> bool {
    let distance = from.distance_to(to) as i32;
    let (dir_y, dir_x) = from.angle_to(to).sin_cos();
    let step = step.max(1);
    let mut length = 0;
    while length < distance {
        length = (length + step).min(distance);
        let x = from.x + (dir_x * length as f32) as i32;
        let y = from.y + (dir_y * length as f32) as i32;
        if blocks_sight(grid.code_at_pixel(x, y)) {
            return false;
        }
    }
    true
}

/// Closest agent under the player's aim, shared between the sight pass and
/// the weapon that consumes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InSights {
    pub target: Option<AgentId>,
    /// Distance from the hit pixel to the target's centre.
    pub crit_distance: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct SightCandidate<'a> {
    pub id: AgentId,
    pub body: &'a Body,
    pub alive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SightRay {
    pub shooter: AgentId,
    pub from: PixelPoint,
    pub angle: f32,
    pub step: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SightTrace {
    pub length: f32,
    pub end: PixelPoint,
    pub in_sights: InSights,
}

/// Marches the ray until it leaves the map, hits a drawn agent pixel, or
/// hits a drawn pixel of a sight-blocking tile.
pub fn trace_sight(
    grid: &TileGrid,
    candidates: &[SightCandidate<'_>],
    viewport: &Viewport,
    ray: &SightRay,
) -> SightTrace {
    let (dir_y, dir_x) = ray.angle.sin_cos();
    let step = ray.step.max(1.0);
    let max_x = grid.pixel_width();
    let max_y = grid.pixel_height();
    let mut length = 0.0f32;
    loop {
        length += step;
        let x = (ray.from.x as f32 + length * dir_x) as i32;
        let y = (ray.from.y as f32 + length * dir_y) as i32;
        let end = PixelPoint::new(x, y);
        let miss = SightTrace {
            length,
            end,
            in_sights: InSights::default(),
        };

        if x < 0 || y < 0 || x > max_x || y > max_y {
            return miss;
        }

        for candidate in candidates {
            if candidate.id == ray.shooter
                || !candidate.alive
                || !candidate.body.is_visible()
                || !candidate.body.is_in_screen(viewport)
            {
                continue;
            }
            let body = candidate.body;
            if !body.contains_point(x, y) || !body.is_at_location(x, y, false) {
                continue;
            }
            let crit_distance = end.distance_to(body.exact_centre()) as i32;
            return SightTrace {
                length,
                end,
                in_sights: InSights {
                    target: Some(candidate.id),
                    crit_distance,
                },
            };
        }

        if blocks_sight(grid.code_at_pixel(x, y)) && grid.tile_pixel_is_set(x, y) {
            return miss;
        }
    }
}

/// Weapon reference point: `offset` from the body centre, turned with the body.
pub fn muzzle_point(body: &Body, offset: PixelPoint) -> PixelPoint {
    let centre = body.exact_centre();
    let (sin, cos) = body.rotation().sin_cos();
    let ox = f64::from(offset.x);
    let oy = f64::from(offset.y);
    PixelPoint::new(
        centre.x + (ox * cos - oy * sin).round() as i32,
        centre.y + (ox * sin + oy * cos).round() as i32,
    )
}

/// Muzzle and bearing toward `aim_point`, or `None` when the aim point is
/// too close to the body to give a meaningful direction.
pub fn aim(
    body: &Body,
    offset: PixelPoint,
    aim_point: PixelPoint,
    min_aim_buffer: f32,
) -> Option<(PixelPoint, f32)> {
    let centre = body.exact_centre();
    let offset_distance = PixelPoint::default().distance_to(offset);
    if centre.distance_to(aim_point) <= offset_distance + min_aim_buffer {
        return None;
    }
    let muzzle = muzzle_point(body, offset);
    Some((muzzle, muzzle.angle_to(aim_point)))
}
