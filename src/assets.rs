//! Overlay image assets.
//!
//! Assets are decoded once at startup and shared read-only by every frame.
//! Only images that carry an alpha channel are accepted.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, ImageError, RgbaImage};

use crate::error::{Error, Result};

/// An immutable RGBA overlay image.
#[derive(Clone, Debug)]
pub struct Asset {
    image: Arc<RgbaImage>,
}

impl Asset {
    /// Wrap an already decoded RGBA image.
    pub fn from_rgba(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    /// Convert a decoded image, rejecting formats without alpha.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelMismatch`] if the image has no alpha channel.
    pub fn from_dynamic(image: DynamicImage, origin: &Path) -> Result<Self> {
        if !image.color().has_alpha() {
            return Err(Error::ChannelMismatch {
                path: origin.to_path_buf(),
            });
        }
        Ok(Self::from_rgba(image.into_rgba8()))
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Source of overlay images.
pub trait AssetLoader {
    /// Load an asset by its file name.
    ///
    /// Unreadable files yield [`Error::MissingAsset`], files that do not
    /// decode yield [`Error::Image`] and images without alpha yield
    /// [`Error::ChannelMismatch`].
    fn load(&self, name: &str) -> Result<Asset>;
}

/// Loads PNG (or any `image`-supported format) files from a directory.
#[derive(Debug, Clone)]
pub struct FsAssetLoader {
    root: PathBuf,
}

impl FsAssetLoader {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }
}

impl AssetLoader for FsAssetLoader {
    fn load(&self, name: &str) -> Result<Asset> {
        let path = self.root.join(name);
        let image = match image::open(&path) {
            Ok(image) => image,
            Err(ImageError::IoError(e)) => {
                tracing::debug!("Failed to open {}: {}", path.display(), e);
                return Err(Error::MissingAsset { path });
            }
            Err(e) => return Err(e.into()),
        };
        Asset::from_dynamic(image, &path)
    }
}

/// Caches loaded assets by name so parts shared between filters and the
/// selector strip are decoded once.
pub struct AssetStore<L> {
    loader: L,
    assets: HashMap<String, Asset>,
}

impl<L: AssetLoader> AssetStore<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            assets: HashMap::new(),
        }
    }

    /// Return the named asset, loading it on first use.
    pub fn fetch(&mut self, name: &str) -> Result<Asset> {
        if let Some(asset) = self.assets.get(name) {
            return Ok(asset.clone());
        }
        let asset = self.loader.load(name)?;
        self.assets.insert(name.to_string(), asset.clone());
        Ok(asset)
    }

    pub fn get(&self, name: &str) -> Option<&Asset> {
        self.assets.get(name)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
