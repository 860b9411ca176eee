//! Layout and naming configuration for appendix generation.
//!
//! [`AppendixConfig::default`] holds the standard appendix layout: an A4 page,
//! the "Appendix B" heading with its introduction, 12pt spacers and `appendix.pdf` as the output
//! file.  The values are plain millimetre/point numbers so the configuration can be built and
//! inspected without touching the rendering crate.

use std::path::{Path, PathBuf};

use crate::discovery::NamingConvention;
use crate::fit::FitBounds;
use crate::model::HeadingLevel;

/// Millimetres per typographic point.
pub const MM_PER_POINT: f64 = 25.4 / 72.0;

/// Width of an A4 page in millimetres.
pub const A4_WIDTH_MM: f64 = 210.0;

/// Height of an A4 page in millimetres.
pub const A4_HEIGHT_MM: f64 = 297.0;

/// Horizontal space reserved around images, subtracted from the page width.
const IMAGE_WIDTH_RESERVE_MM: f64 = 40.0;

/// Vertical space reserved for headings and titles, subtracted from the page height.
const IMAGE_HEIGHT_RESERVE_MM: f64 = 100.0;

const DEFAULT_OUTPUT_FILE: &str = "appendix.pdf";

const DEFAULT_TITLE: &str = "Appendix B: Analysis Models";

const DEFAULT_INTRODUCTION: &str = "In this appendix, we present the analysis models for the \
National Health Research Data Repository, offering a comprehensive representation of each system \
feature’s functionality, interactions, and components within the platform. These analysis models \
include class diagrams, component diagrams, state-transition diagrams, activity diagrams, \
sequence diagrams, and use case diagrams, which provide a comprehensive understanding of each \
feature's functionality and interactions within the system.";

/// Converts a length in points into millimetres.
pub fn points_to_mm(points: f64) -> f64 {
    points * MM_PER_POINT
}

/// Page margins in millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageMargins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl PageMargins {
    /// Creates margins with the same vertical and the same horizontal value.
    pub fn symmetric(vertical: f64, horizontal: f64) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }
}

impl Default for PageMargins {
    fn default() -> Self {
        // Horizontal margins match the image width reserve so fitted images span the text column.
        Self::symmetric(25.0, IMAGE_WIDTH_RESERVE_MM / 2.0)
    }
}

/// Font size and surrounding space for one heading level, in points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadingStyle {
    pub font_size: u8,
    pub space_before: f64,
    pub space_after: f64,
}

impl HeadingStyle {
    pub const fn new(font_size: u8, space_before: f64, space_after: f64) -> Self {
        Self {
            font_size,
            space_before,
            space_after,
        }
    }
}

/// Heading styles for the three heading levels used by the appendix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadingStyles {
    /// Document title.
    pub title: HeadingStyle,
    /// Feature folder headings.
    pub feature: HeadingStyle,
    /// Diagram titles.
    pub diagram: HeadingStyle,
}

impl Default for HeadingStyles {
    fn default() -> Self {
        Self {
            title: HeadingStyle::new(20, 0.0, 12.0),
            feature: HeadingStyle::new(16, 0.0, 8.0),
            diagram: HeadingStyle::new(14, 6.0, 6.0),
        }
    }
}

impl HeadingStyles {
    pub fn for_level(&self, level: HeadingLevel) -> HeadingStyle {
        match level {
            HeadingLevel::Title => self.title,
            HeadingLevel::Feature => self.feature,
            HeadingLevel::Diagram => self.diagram,
        }
    }
}

/// Complete configuration for one appendix run.
#[derive(Clone, Debug, PartialEq)]
pub struct AppendixConfig {
    title: String,
    introduction: String,
    output_path: PathBuf,
    paper_size: (f64, f64),
    margins: PageMargins,
    fit_bounds: FitBounds,
    naming: NamingConvention,
    headings: HeadingStyles,
    body_font_size: u8,
    spacer_points: f64,
}

impl Default for AppendixConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_owned(),
            introduction: DEFAULT_INTRODUCTION.to_owned(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            paper_size: (A4_WIDTH_MM, A4_HEIGHT_MM),
            margins: PageMargins::default(),
            fit_bounds: FitBounds::for_page(
                A4_WIDTH_MM,
                A4_HEIGHT_MM,
                IMAGE_WIDTH_RESERVE_MM,
                IMAGE_HEIGHT_RESERVE_MM,
            ),
            naming: NamingConvention::default(),
            headings: HeadingStyles::default(),
            body_font_size: 12,
            spacer_points: 12.0,
        }
    }
}

impl AppendixConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn introduction(&self) -> &str {
        &self.introduction
    }

    /// Path the rendered document is written to, relative to the working directory.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Paper size as `(width, height)` in millimetres.
    pub fn paper_size(&self) -> (f64, f64) {
        self.paper_size
    }

    pub fn margins(&self) -> PageMargins {
        self.margins
    }

    pub fn fit_bounds(&self) -> FitBounds {
        self.fit_bounds
    }

    pub fn naming(&self) -> &NamingConvention {
        &self.naming
    }

    pub fn headings(&self) -> &HeadingStyles {
        &self.headings
    }

    pub fn body_font_size(&self) -> u8 {
        self.body_font_size
    }

    /// Height of the vertical spacer blocks in millimetres.
    pub fn spacer_mm(&self) -> f64 {
        points_to_mm(self.spacer_points)
    }

    /// Height available for content on a page once the margins are applied.
    pub fn content_height_mm(&self) -> f64 {
        self.paper_size.1 - self.margins.top - self.margins.bottom
    }

    /// Sets the document title and returns the updated configuration.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the introduction paragraph and returns the updated configuration.
    pub fn with_introduction(mut self, introduction: impl Into<String>) -> Self {
        self.introduction = introduction.into();
        self
    }

    /// Sets the output path and returns the updated configuration.
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Sets the paper size in millimetres and returns the updated configuration.
    ///
    /// The fit bounds are not recomputed; call [`AppendixConfig::with_fit_bounds`] as well when
    /// the images should follow the new page.
    pub fn with_paper_size(mut self, width_mm: f64, height_mm: f64) -> Self {
        self.paper_size = (width_mm, height_mm);
        self
    }

    /// Sets the page margins and returns the updated configuration.
    pub fn with_margins(mut self, margins: PageMargins) -> Self {
        self.margins = margins;
        self
    }

    /// Sets the maximum display size of diagrams and returns the updated configuration.
    pub fn with_fit_bounds(mut self, bounds: FitBounds) -> Self {
        self.fit_bounds = bounds;
        self
    }

    /// Sets the folder naming convention and returns the updated configuration.
    pub fn with_naming(mut self, naming: NamingConvention) -> Self {
        self.naming = naming;
        self
    }

    /// Sets the heading styles and returns the updated configuration.
    pub fn with_headings(mut self, headings: HeadingStyles) -> Self {
        self.headings = headings;
        self
    }

    /// Sets the spacer height in points and returns the updated configuration.
    pub fn with_spacer_points(mut self, points: f64) -> Self {
        self.spacer_points = points;
        self
    }
}
