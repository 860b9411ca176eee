//! Error type shared by every stage of appendix generation.

use std::fmt;
use std::io;
use std::path::PathBuf;

#[cfg(feature = "bookmarks")]
use crate::bookmarks::BookmarkError;
use crate::fit::FitError;

/// Failures that abort an appendix run.
#[derive(Debug)]
pub enum AppendixError {
    /// The root folder does not exist or is not a directory.
    InputNotFound { path: PathBuf },
    /// A directory could not be listed.
    Io { path: PathBuf, source: io::Error },
    /// A feature folder name does not carry the expected numeric token.
    NamingConvention { folder: String, reason: String },
    /// A `*.png` file could not be read as an image.
    ImageDecode {
        path: PathBuf,
        source: image::ImageError,
    },
    /// An image reported dimensions that cannot be fitted.
    InvalidDimensions { path: PathBuf, source: FitError },
    /// No usable font family could be loaded.
    FontLoad(genpdf::error::Error),
    /// The document could not be laid out or serialized.
    Render(genpdf::error::Error),
    /// The rendered document could not be written.
    Write { path: PathBuf, source: io::Error },
    /// The document outline could not be embedded.
    #[cfg(feature = "bookmarks")]
    Bookmarks(BookmarkError),
}

impl fmt::Display for AppendixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputNotFound { path } => write!(
                f,
                "Input folder not found or not a directory: {}",
                path.display()
            ),
            Self::Io { path, .. } => write!(f, "Failed to read directory {}", path.display()),
            Self::NamingConvention { folder, reason } => write!(
                f,
                "Feature folder '{}' does not follow the naming convention: {}",
                folder, reason
            ),
            Self::ImageDecode { path, .. } => {
                write!(f, "Failed to decode image {}", path.display())
            }
            Self::InvalidDimensions { path, .. } => {
                write!(f, "Image {} has invalid dimensions", path.display())
            }
            Self::FontLoad(_) => write!(f, "Failed to load fonts for rendering"),
            Self::Render(_) => write!(f, "Failed to render the PDF document"),
            Self::Write { path, .. } => write!(f, "Failed to write {}", path.display()),
            #[cfg(feature = "bookmarks")]
            Self::Bookmarks(_) => write!(f, "Failed to embed feature bookmarks"),
        }
    }
}

impl std::error::Error for AppendixError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } | Self::Write { source, .. } => Some(source),
            Self::ImageDecode { source, .. } => Some(source),
            Self::InvalidDimensions { source, .. } => Some(source),
            Self::FontLoad(err) | Self::Render(err) => Some(err),
            #[cfg(feature = "bookmarks")]
            Self::Bookmarks(err) => Some(err),
            Self::InputNotFound { .. } | Self::NamingConvention { .. } => None,
        }
    }
}

impl From<genpdf::error::Error> for AppendixError {
    fn from(err: genpdf::error::Error) -> Self {
        Self::Render(err)
    }
}

#[cfg(feature = "bookmarks")]
impl From<BookmarkError> for AppendixError {
    fn from(err: BookmarkError) -> Self {
        Self::Bookmarks(err)
    }
}
