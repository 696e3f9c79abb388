use std::sync::Arc;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Packed `0xRRGGBB` colour treated as "not drawn" when building masks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaskColour(pub u32);

impl MaskColour {
    pub const BLACK: MaskColour = MaskColour(0x000000);

    pub fn pack(pixel: &Rgba<u8>) -> u32 {
        let [r, g, b, _] = pixel.0;
        (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
    }

    pub fn matches(self, pixel: &Rgba<u8>) -> bool {
        Self::pack(pixel) == self.0
    }
}

/// Per-frame occupancy grid. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl PixelMask {
    pub fn from_image(image: &RgbaImage, mask_colour: MaskColour) -> Self {
        Self::from_fn(image.width(), image.height(), |x, y| {
            !mask_colour.matches(image.get_pixel(x, y))
        })
    }

    /// Only rows from `height * centre_y` downward are kept, so melee frames
    /// register hits in front of the sprite and never behind it.
    pub fn from_image_front(image: &RgbaImage, mask_colour: MaskColour, centre_y: f64) -> Self {
        let first_row = (f64::from(image.height()) * centre_y).max(0.0) as u32;
        Self::from_fn(image.width(), image.height(), |x, y| {
            y >= first_row && !mask_colour.matches(image.get_pixel(x, y))
        })
    }

    pub fn from_fn<F>(width: u32, height: u32, mut occupied: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        let mut bits = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                bits.push(occupied(x, y));
            }
        }
        Self {
            width,
            height,
            bits,
        }
    }

    pub fn filled(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![true; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_set(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return false;
        }
        self.bits[y as usize * self.width as usize + x as usize]
    }

    pub fn occupied_count(&self) -> usize {
        self.bits.iter().filter(|bit| **bit).count()
    }
}

/// Out-of-bounds lookups are always unoccupied.
pub fn point_occupied(mask: &PixelMask, x: i32, y: i32) -> bool {
    mask.is_set(x, y)
}

pub type SpriteFrames = Arc<[PixelMask]>;

/// One frame of a shared frame set.
#[derive(Debug, Clone)]
pub struct MaskHandle {
    frames: SpriteFrames,
    index: usize,
}

impl MaskHandle {
    pub fn new(frames: SpriteFrames, index: usize) -> Option<Self> {
        if index >= frames.len() {
            return None;
        }
        Some(Self { frames, index })
    }

    pub fn single(mask: PixelMask) -> Self {
        Self {
            frames: Arc::from(vec![mask]),
            index: 0,
        }
    }

    pub fn mask(&self) -> &PixelMask {
        &self.frames[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn frames(&self) -> &SpriteFrames {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn with_index(&self, index: usize) -> Self {
        Self {
            frames: Arc::clone(&self.frames),
            index: index % self.frames.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 3 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([(x * 40) as u8, (y * 30) as u8, 7, 255])
            }
        })
    }

    #[test]
    fn mask_bit_matches_pixel_colour_comparison() {
        let image = checker_image(6, 5);
        let colours = [MaskColour::BLACK, MaskColour(0x280007), MaskColour(0xffffff)];
        for mask_colour in colours {
            let mask = PixelMask::from_image(&image, mask_colour);
            assert_eq!((mask.width(), mask.height()), (6, 5));
            for y in 0..5 {
                for x in 0..6 {
                    let expected = MaskColour::pack(image.get_pixel(x, y)) != mask_colour.0;
                    assert_eq!(
                        mask.is_set(x as i32, y as i32),
                        expected,
                        "x={x} y={y} colour={mask_colour:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn alpha_does_not_affect_mask_comparison() {
        let image = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([9, 9, 9, 0])
            }
        });
        let mask = PixelMask::from_image(&image, MaskColour::BLACK);
        assert!(!mask.is_set(0, 0));
        assert!(mask.is_set(1, 0));
    }

    #[test]
    fn out_of_bounds_points_are_unoccupied() {
        let mask = PixelMask::filled(4, 4);
        assert!(point_occupied(&mask, 3, 3));
        for (x, y) in [(-1, 0), (0, -1), (4, 0), (0, 4), (i32::MIN, i32::MAX)] {
            assert!(!point_occupied(&mask, x, y), "x={x} y={y}");
        }
    }

    #[test]
    fn front_mask_clears_rows_above_centre() {
        let image = RgbaImage::from_pixel(4, 10, Rgba([200, 10, 10, 255]));
        let mask = PixelMask::from_image_front(&image, MaskColour::BLACK, 0.4);
        assert!(!mask.is_set(1, 3));
        assert!(mask.is_set(1, 4));
        assert_eq!(mask.occupied_count(), 4 * 6);
    }

    #[test]
    fn mask_handle_wraps_index_and_shares_frames() {
        let frames: SpriteFrames = Arc::from(vec![
            PixelMask::filled(1, 1),
            PixelMask::from_fn(1, 1, |_, _| false),
        ]);
        let handle = MaskHandle::new(Arc::clone(&frames), 1).expect("frame");
        assert!(!handle.mask().is_set(0, 0));
        let wrapped = handle.with_index(2);
        assert_eq!(wrapped.index(), 0);
        assert!(Arc::ptr_eq(wrapped.frames(), &frames));
        assert!(MaskHandle::new(frames, 5).is_none());
    }
}
