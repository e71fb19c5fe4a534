use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView as _};

use crate::error::AppError;
use crate::transform::decode;

/// Default preview box, matching the on-screen image area.
pub const DEFAULT_BOUNDS: Bounds = Bounds {
    width: 800,
    height: 800,
};

/// Box a preview must fit inside. Both sides are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    width: u32,
    height: u32,
}

impl Bounds {
    /// # Errors
    ///
    /// Returns `AppError::InvalidBounds` if either side is zero.
    pub fn new(width: u32, height: u32) -> Result<Self, AppError> {
        if width == 0 || height == 0 {
            return Err(AppError::InvalidBounds { width, height });
        }
        Ok(Self { width, height })
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }
}

impl Default for Bounds {
    fn default() -> Self {
        DEFAULT_BOUNDS
    }
}

/// Display-ready image scaled to fit its bounds.
#[derive(Debug, Clone)]
pub struct Preview {
    pub image: DynamicImage,
}

impl Preview {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Loads the image at `path` and scales it to fit `bounds`, keeping
/// its aspect ratio. Small images are scaled up as well as large ones
/// down.
///
/// # Errors
///
/// Returns `AppError::Decode` (or `AppError::Io`) if the image cannot
/// be loaded.
pub fn render_preview(path: &Path, bounds: Bounds) -> Result<Preview, AppError> {
    let image = decode(path)?;
    let preview = scale_to_fit(&image, bounds);

    log::debug!(
        "Preview {}: {:?} -> {:?}",
        path.display(),
        image.dimensions(),
        preview.dimensions()
    );

    Ok(preview)
}

/// Scales `image` to fit inside `bounds` with its ratio preserved.
pub fn scale_to_fit(image: &DynamicImage, bounds: Bounds) -> Preview {
    Preview {
        image: image.resize(bounds.width, bounds.height, FilterType::Triangle),
    }
}
