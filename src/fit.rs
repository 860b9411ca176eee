//! Aspect-preserving image fitting.
//!
//! [`fit_within`] is pure and works on millimetre [`Dimensions`]; [`FittedImage::probe`] adds the
//! only I/O, reading an image header to learn its pixel size.

use std::fmt;
use std::path::{Path, PathBuf};

use log::debug;

use crate::config::MM_PER_POINT;
use crate::error::AppendixError;

/// Width and height in millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Native display size of an image, treating one pixel as one point.
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(
            f64::from(width) * MM_PER_POINT,
            f64::from(height) * MM_PER_POINT,
        )
    }

    /// Height divided by width.
    pub fn aspect_ratio(&self) -> f64 {
        self.height / self.width
    }

    fn scaled(self, factor: f64) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }

    fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Maximum display size of a diagram.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitBounds {
    max_width: f64,
    max_height: f64,
}

impl FitBounds {
    pub fn new(max_width: f64, max_height: f64) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    /// Derives the bounds from a page size minus fixed reserves.
    pub fn for_page(
        page_width: f64,
        page_height: f64,
        width_reserve: f64,
        height_reserve: f64,
    ) -> Self {
        Self::new(page_width - width_reserve, page_height - height_reserve)
    }

    pub fn max_width(&self) -> f64 {
        self.max_width
    }

    pub fn max_height(&self) -> f64 {
        self.max_height
    }
}

/// Errors raised by [`fit_within`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FitError {
    /// The source dimensions were zero, negative or not finite.
    InvalidDimensions { width: f64, height: f64 },
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimensions { width, height } => write!(
                f,
                "image dimensions must be positive, got {} x {}",
                width, height
            ),
        }
    }
}

impl std::error::Error for FitError {}

/// Scales `native` down until it fits `bounds`, preserving the aspect ratio.
///
/// The height is clamped first and the width second; each step scales both sides by the same
/// factor. Images already inside the bounds keep their native size, including very small ones.
pub fn fit_within(native: Dimensions, bounds: FitBounds) -> Result<Dimensions, FitError> {
    if !native.is_valid() {
        return Err(FitError::InvalidDimensions {
            width: native.width,
            height: native.height,
        });
    }

    let mut fitted = native;
    if fitted.height > bounds.max_height {
        fitted = fitted.scaled(bounds.max_height / fitted.height);
    }
    if fitted.width > bounds.max_width {
        fitted = fitted.scaled(bounds.max_width / fitted.width);
    }
    Ok(fitted)
}

/// A diagram together with the size it is displayed at.
#[derive(Clone, Debug, PartialEq)]
pub struct FittedImage {
    source: PathBuf,
    size: Dimensions,
}

impl FittedImage {
    pub fn new(source: impl Into<PathBuf>, size: Dimensions) -> Self {
        Self {
            source: source.into(),
            size,
        }
    }

    /// Reads the pixel size of the image at `path` and fits it into `bounds`.
    pub fn probe(path: impl AsRef<Path>, bounds: FitBounds) -> Result<Self, AppendixError> {
        let path = path.as_ref();
        let (px_width, px_height) =
            image::image_dimensions(path).map_err(|source| AppendixError::ImageDecode {
                path: path.to_path_buf(),
                source,
            })?;

        let size = fit_within(Dimensions::from_pixels(px_width, px_height), bounds).map_err(
            |source| AppendixError::InvalidDimensions {
                path: path.to_path_buf(),
                source,
            },
        )?;

        debug!(
            "Fitted {} ({}x{} px) to {:.1}x{:.1} mm",
            path.display(),
            px_width,
            px_height,
            size.width,
            size.height
        );
        Ok(Self::new(path, size))
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Display size in millimetres.
    pub fn size(&self) -> Dimensions {
        self.size
    }
}
