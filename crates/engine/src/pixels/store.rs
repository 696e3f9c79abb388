use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{ImageReader, RgbaImage};
use thiserror::Error;
use tracing::{debug, info};

use crate::sprite_keys::{validate_sprite_key, SpriteKeyError};
use crate::tiles::{GridError, TileAtlas};

use super::mask::{MaskColour, MaskHandle, PixelMask, SpriteFrames};

pub const TILE_ATLAS_KEY: &str = "tiles";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("invalid sprite key '{key}': {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: SpriteKeyError,
    },
    #[error("sprite key '{0}' has not been loaded")]
    UnknownKey(String),
    #[error("failed to read asset directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open image {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("asset directory {0} contains no .png frames")]
    EmptyDirectory(PathBuf),
    #[error("sprite key '{0}' has no frames")]
    NoFrames(String),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// How frames are cut into masks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaskCut {
    Full,
    /// Keep rows from `height * centre_y` down; used for melee swings.
    Front { centre_y: f64 },
}

/// Decoded sprite masks keyed by validated sprite key. Owned by whoever runs
/// the level and shared out as `Arc` slices.
#[derive(Debug, Clone)]
pub struct AssetStore {
    mask_colour: MaskColour,
    frames: HashMap<String, SpriteFrames>,
}

impl Default for AssetStore {
    fn default() -> Self {
        Self::new(MaskColour::BLACK)
    }
}

impl AssetStore {
    pub fn new(mask_colour: MaskColour) -> Self {
        Self {
            mask_colour,
            frames: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.frames.contains_key(key)
    }

    pub fn insert_frames(
        &mut self,
        key: &str,
        masks: Vec<PixelMask>,
    ) -> Result<SpriteFrames, AssetError> {
        validate_sprite_key(key).map_err(|source| AssetError::InvalidKey {
            key: key.to_string(),
            source,
        })?;
        if masks.is_empty() {
            return Err(AssetError::NoFrames(key.to_string()));
        }
        let frames: SpriteFrames = Arc::from(masks);
        self.frames.insert(key.to_string(), Arc::clone(&frames));
        debug!(sprite_key = key, frames = frames.len(), "sprite_frames_registered");
        Ok(frames)
    }

    pub fn insert_images(
        &mut self,
        key: &str,
        images: &[RgbaImage],
        cut: MaskCut,
    ) -> Result<SpriteFrames, AssetError> {
        let masks = images
            .iter()
            .map(|image| self.cut_mask(image, cut))
            .collect();
        self.insert_frames(key, masks)
    }

    /// Loads every `*.png` in `dir`, in file-name order, as the frames of `key`.
    pub fn load_directory(
        &mut self,
        key: &str,
        dir: &Path,
        cut: MaskCut,
    ) -> Result<SpriteFrames, AssetError> {
        let entries = fs::read_dir(dir).map_err(|source| AssetError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| AssetError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let is_png = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
            if is_png && path.is_file() {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(AssetError::EmptyDirectory(dir.to_path_buf()));
        }
        paths.sort();

        let mut images = Vec::with_capacity(paths.len());
        for path in &paths {
            images.push(decode_rgba(path)?);
        }
        let frames = self.insert_images(key, &images, cut)?;
        info!(
            sprite_key = key,
            dir = %dir.display(),
            frames = frames.len(),
            "sprite_directory_loaded"
        );
        Ok(frames)
    }

    pub fn frames(&self, key: &str) -> Result<SpriteFrames, AssetError> {
        self.frames
            .get(key)
            .cloned()
            .ok_or_else(|| AssetError::UnknownKey(key.to_string()))
    }

    pub fn handle(&self, key: &str) -> Result<MaskHandle, AssetError> {
        let frames = self.frames(key)?;
        MaskHandle::new(frames, 0).ok_or_else(|| AssetError::NoFrames(key.to_string()))
    }

    /// Builds the tile atlas from the first frame under [`TILE_ATLAS_KEY`].
    pub fn tile_atlas(&self, tile_size: u32, columns: u32) -> Result<TileAtlas, AssetError> {
        let frames = self.frames(TILE_ATLAS_KEY)?;
        let mask = frames
            .first()
            .cloned()
            .ok_or_else(|| AssetError::NoFrames(TILE_ATLAS_KEY.to_string()))?;
        Ok(TileAtlas::new(tile_size, columns, mask)?)
    }

    fn cut_mask(&self, image: &RgbaImage, cut: MaskCut) -> PixelMask {
        match cut {
            MaskCut::Full => PixelMask::from_image(image, self.mask_colour),
            MaskCut::Front { centre_y } => {
                PixelMask::from_image_front(image, self.mask_colour, centre_y)
            }
        }
    }
}

fn decode_rgba(path: &Path) -> Result<RgbaImage, AssetError> {
    let reader = ImageReader::open(path).map_err(|source| AssetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = reader.decode().map_err(|source| AssetError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decoded.to_rgba8())
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    fn frame(width: u32, drawn_column: u32) -> RgbaImage {
        RgbaImage::from_fn(width, 2, |x, _| {
            if x == drawn_column {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        })
    }

    #[test]
    fn load_directory_reads_pngs_in_name_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        frame(3, 2).save(dir.path().join("walk_1.png")).expect("save");
        frame(3, 0).save(dir.path().join("walk_0.png")).expect("save");
        fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

        let mut store = AssetStore::default();
        let frames = store
            .load_directory("zombie/walk", dir.path(), MaskCut::Full)
            .expect("load");
        assert_eq!(frames.len(), 2);
        assert!(frames[0].is_set(0, 0));
        assert!(frames[1].is_set(2, 1));
        assert!(!frames[1].is_set(0, 1));
        assert!(Arc::ptr_eq(
            &store.frames("zombie/walk").expect("frames"),
            &frames
        ));
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = AssetStore::default();
        let err = store
            .load_directory("player", dir.path(), MaskCut::Full)
            .expect_err("empty");
        assert!(matches!(err, AssetError::EmptyDirectory(_)));
    }

    #[test]
    fn keys_are_validated_and_lookups_fail_cleanly() {
        let mut store = AssetStore::default();
        let err = store
            .insert_frames("Bad/Key", vec![PixelMask::filled(1, 1)])
            .expect_err("invalid");
        assert!(matches!(err, AssetError::InvalidKey { .. }));
        assert!(matches!(
            store.frames("missing"),
            Err(AssetError::UnknownKey(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn tile_atlas_comes_from_registered_sheet() {
        let mut store = AssetStore::default();
        store
            .insert_frames(TILE_ATLAS_KEY, vec![PixelMask::filled(20, 8)])
            .expect("insert");
        let atlas = store.tile_atlas(4, 5).expect("atlas");
        assert!(atlas.pixel_set(9, 3, 3));
        assert!(!atlas.pixel_set(10, 0, 0));
    }
}
