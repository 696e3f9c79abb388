mod collision;
mod mask;
mod store;

pub use collision::{bodies_touch, objects_collide, tile_collision};
pub use mask::{point_occupied, MaskColour, MaskHandle, PixelMask, SpriteFrames};
pub use store::{AssetError, AssetStore, MaskCut, TILE_ATLAS_KEY};
