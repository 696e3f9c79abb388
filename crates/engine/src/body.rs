use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::geometry::PixelPoint;
use crate::pixels::MaskHandle;

/// Visible window onto the map, in world pixels. The bottom `hud_height`
/// rows are covered by the HUD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub origin: PixelPoint,
    pub width: i32,
    pub height: i32,
    pub hud_height: i32,
}

impl Viewport {
    pub fn new(width: i32, height: i32, hud_height: i32) -> Self {
        Self {
            origin: PixelPoint::default(),
            width,
            height,
            hud_height,
        }
    }

    pub fn centred_on(self, point: PixelPoint) -> Self {
        let playable_height = self.height - self.hud_height;
        Self {
            origin: PixelPoint::new(point.x - self.width / 2, point.y - playable_height / 2),
            ..self
        }
    }
}

/// Placement, facing and pixel masks of anything drawn on the map.
#[derive(Debug, Clone)]
pub struct Body {
    position: PixelPoint,
    width: u32,
    height: u32,
    centre_offset_x: f64,
    centre_offset_y: f64,
    rotation: f64,
    initial_rotation: f64,
    visible: bool,
    current_mask: MaskHandle,
    default_mask: MaskHandle,
}

impl Body {
    /// Places the body so that its centre point lands on `centre`.
    pub fn new(
        centre: PixelPoint,
        mask: MaskHandle,
        centre_offset_x: f64,
        centre_offset_y: f64,
    ) -> Self {
        let width = mask.mask().width();
        let height = mask.mask().height();
        let mut body = Self {
            position: PixelPoint::default(),
            width,
            height,
            centre_offset_x,
            centre_offset_y,
            rotation: 0.0,
            initial_rotation: 0.0,
            visible: true,
            current_mask: mask.clone(),
            default_mask: mask,
        };
        let (cx, cy) = body.centre_px();
        body.position = PixelPoint::new(centre.x - cx, centre.y - cy);
        body
    }

    /// Heading the artwork is drawn facing, in radians (0 = east, y down).
    pub fn with_initial_rotation(mut self, initial_rotation: f64) -> Self {
        self.initial_rotation = initial_rotation;
        self
    }

    pub fn position(&self) -> PixelPoint {
        self.position
    }

    pub fn set_position(&mut self, position: PixelPoint) {
        self.position = position;
    }

    pub fn translate(&mut self, dx: i32, dy: i32) {
        self.position.x += dx;
        self.position.y += dy;
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn centre_px(&self) -> (i32, i32) {
        (
            (self.centre_offset_x * f64::from(self.width)) as i32,
            (self.centre_offset_y * f64::from(self.height)) as i32,
        )
    }

    pub fn centre_offset_y(&self) -> f64 {
        self.centre_offset_y
    }

    pub fn exact_centre(&self) -> PixelPoint {
        let (cx, cy) = self.centre_px();
        PixelPoint::new(self.position.x + cx, self.position.y + cy)
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: f64) {
        self.rotation = rotation;
    }

    /// Turns the artwork to face `angle` radians (0 = east, y down).
    pub fn face_angle(&mut self, angle: f64) {
        self.rotation = (angle - self.initial_rotation).rem_euclid(TAU);
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn current_mask(&self) -> &MaskHandle {
        &self.current_mask
    }

    pub fn default_mask(&self) -> &MaskHandle {
        &self.default_mask
    }

    /// Swaps the active frame; the default mask keeps its pose.
    pub fn set_current_mask(&mut self, mask: MaskHandle) {
        self.current_mask = mask;
    }

    pub fn set_default_mask(&mut self, mask: MaskHandle) {
        self.default_mask = mask;
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.position.x
            && y >= self.position.y
            && x < self.position.x + self.width as i32
            && y < self.position.y + self.height as i32
    }

    /// Whether the (rotated) sprite is drawn at world pixel `(x, y)`.
    pub fn is_at_location(&self, x: i32, y: i32, use_default: bool) -> bool {
        let local_x = f64::from(x - self.position.x);
        let local_y = f64::from(y - self.position.y);
        if local_x < 0.0
            || local_y < 0.0
            || local_x > f64::from(self.width)
            || local_y > f64::from(self.height)
        {
            return false;
        }

        let (cx, cy) = self.centre_px();
        let (cx, cy) = (f64::from(cx), f64::from(cy));
        let (sin, cos) = (-self.rotation).sin_cos();
        let dx = local_x - cx;
        let dy = local_y - cy;
        let source_x = cx + dx * cos - dy * sin;
        let source_y = cy + dx * sin + dy * cos;

        let mask = if use_default {
            self.default_mask.mask()
        } else {
            self.current_mask.mask()
        };
        mask.is_set(source_x.floor() as i32, source_y.floor() as i32)
    }

    pub fn is_in_screen(&self, viewport: &Viewport) -> bool {
        let x = self.position.x - viewport.origin.x;
        let y = self.position.y - viewport.origin.y;
        let w = self.width as i32;
        let h = self.height as i32;
        x > -w && x < viewport.width + w && y > -h && y < viewport.height + h - viewport.hud_height
    }
}
