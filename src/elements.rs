//! Element implementations built on top of `genpdf` primitives.
//!
//! This module turns the blocks of a [`ContentStream`][crate::model::ContentStream] into
//! renderable elements: styled headings, fixed-height spacers, and [`DiagramGroup`], which keeps
//! a diagram title and its image on the same page.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb};
use log::debug;

use genpdf::elements::{Image, LinearLayout, PaddedElement, Paragraph, StyledElement};
use genpdf::error::Error;
use genpdf::style::{Style, StyledString};
use genpdf::{render, Alignment, Element, Margins, Mm, RenderResult, Scale, Size};

use crate::builder::PageCounter;
use crate::config::{points_to_mm, HeadingStyle};
use crate::error::AppendixError;
use crate::model::{DiagramBlock, Heading};

/// Resolution `genpdf` assumes for images without an explicit DPI.
const GENPDF_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

fn natural_image_size(image: &DynamicImage) -> (f64, f64) {
    let (px_width, px_height) = image.dimensions();
    (
        MM_PER_INCH * f64::from(px_width) / GENPDF_IMAGE_DPI,
        MM_PER_INCH * f64::from(px_height) / GENPDF_IMAGE_DPI,
    )
}

/// Loads an image from `path` using the [`image`] crate.
pub fn decode_image_from_path(path: impl AsRef<Path>) -> Result<DynamicImage, AppendixError> {
    let path = path.as_ref();
    let decode_error = |source| AppendixError::ImageDecode {
        path: path.to_path_buf(),
        source,
    };
    image::io::Reader::open(path)
        .map_err(|err| decode_error(image::ImageError::IoError(err)))?
        .with_guessed_format()
        .map_err(|err| decode_error(image::ImageError::IoError(err)))?
        .decode()
        .map_err(decode_error)
}

/// Composites images with an alpha channel onto a white background.
///
/// `genpdf` rejects images carrying transparency, which is common for exported diagrams.
pub fn flatten_alpha(image: DynamicImage) -> DynamicImage {
    if !image.color().has_alpha() {
        return image;
    }

    let rgba = image.to_rgba8();
    let flattened = ImageBuffer::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u32::from(a);
        let blend = |channel: u8| ((u32::from(channel) * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    });
    DynamicImage::ImageRgb8(flattened)
}

/// Creates a single heading paragraph with the configured size and spacing.
pub fn heading_element(
    heading: &Heading,
    style: HeadingStyle,
) -> PaddedElement<StyledElement<Paragraph>> {
    Paragraph::new(heading.text())
        .styled(Style::new().with_font_size(style.font_size))
        .padded(Margins::trbl(
            mm_from_f64(points_to_mm(style.space_before)),
            Mm::default(),
            mm_from_f64(points_to_mm(style.space_after)),
            Mm::default(),
        ))
}

/// Fixed vertical gap.  At the bottom of a page the gap is truncated instead of carried over.
pub struct Spacer {
    height: Mm,
}

impl Spacer {
    pub fn new(height_mm: f64) -> Self {
        Self {
            height: mm_from_f64(height_mm),
        }
    }
}

impl Element for Spacer {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let available = area.size().height;
        let height = if self.height > available {
            available
        } else {
            self.height
        };
        let mut result = RenderResult::default();
        result.size = Size::new(0, height);
        Ok(result)
    }
}

/// A diagram title stacked above its image, moved to the next page as a whole when the remaining
/// space on the current page is too small.
///
/// Groups taller than an empty page are rendered where they start, so layout always progresses.
pub struct DiagramGroup {
    title: StyledString,
    title_padding: Mm,
    image_height: Mm,
    page_height: Mm,
    layout: LinearLayout,
    deferred: bool,
}

impl DiagramGroup {
    /// Decodes the diagram image and prepares the group for rendering.
    ///
    /// `page_height` is the content height of an empty page.
    pub fn new(
        block: &DiagramBlock,
        style: HeadingStyle,
        page_height: Mm,
    ) -> Result<Self, AppendixError> {
        let fitted = block.image();
        let dynamic = flatten_alpha(decode_image_from_path(fitted.source())?);
        let (natural_width, natural_height) = natural_image_size(&dynamic);
        let size = fitted.size();

        let mut image = Image::from_dynamic_image(dynamic).map_err(AppendixError::Render)?;
        image.set_alignment(Alignment::Center);
        image.set_scale(Scale::new(
            size.width / natural_width,
            size.height / natural_height,
        ));

        let mut layout = LinearLayout::vertical();
        layout.push(heading_element(block.title(), style));
        layout.push(image);

        Ok(Self {
            title: StyledString::new(
                block.title().text().to_owned(),
                Style::new().with_font_size(style.font_size),
            ),
            title_padding: mm_from_f64(points_to_mm(style.space_before + style.space_after)),
            image_height: mm_from_f64(size.height),
            page_height,
            layout,
            deferred: false,
        })
    }

    fn required_height(&self, context: &genpdf::Context, width: Mm, style: Style) -> Mm {
        let mut title = self.title.clone();
        title.style = style.and(title.style);
        let line_height = mm_to_f64(title.style.line_height(&context.font_cache));
        let text_width = mm_to_f64(title.width(&context.font_cache));
        let lines = title_line_count(text_width, mm_to_f64(width));

        mm_from_f64(
            line_height * lines + mm_to_f64(self.title_padding) + mm_to_f64(self.image_height),
        )
    }
}

/// Upper bound on the number of lines a title of `text_width` wraps to in `available` mm.
///
/// Word wrapping can leave part of each line empty, so a title wider than the area is given one
/// extra line.
fn title_line_count(text_width: f64, available: f64) -> f64 {
    if available <= f64::EPSILON {
        return 1.0;
    }
    let lines = (text_width / available).ceil().max(1.0);
    if text_width > available {
        lines + 1.0
    } else {
        lines
    }
}

/// Whether a group needing `required` space should start on a fresh page instead of the
/// `available` rest of the current one.  Groups taller than `page_height` never move.
fn needs_new_page(required: Mm, available: Mm, page_height: Mm) -> bool {
    required > available && required <= page_height
}

impl Element for DiagramGroup {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        if !self.deferred {
            self.deferred = true;
            let required = self.required_height(context, area.size().width, style);
            if needs_new_page(required, area.size().height, self.page_height) {
                debug!("Moving diagram '{}' to the next page", self.title.s);
                let mut result = RenderResult::default();
                result.has_more = true;
                return Ok(result);
            }
        }

        self.layout.render(context, area, style)
    }
}

/// Wraps an element and records the page on which it first produces output.
pub struct PageTracked<E> {
    inner: E,
    pages: PageCounter,
    recorded: Rc<RefCell<Vec<Option<usize>>>>,
    index: usize,
}

impl<E: Element> PageTracked<E> {
    /// Records into slot `index` of `recorded` once `inner` has been drawn.
    pub fn new(
        inner: E,
        pages: PageCounter,
        recorded: Rc<RefCell<Vec<Option<usize>>>>,
        index: usize,
    ) -> Self {
        Self {
            inner,
            pages,
            recorded,
            index,
        }
    }
}

impl<E: Element> Element for PageTracked<E> {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let result = self.inner.render(context, area, style)?;
        if result.size.height > Mm::default() {
            let mut recorded = self.recorded.borrow_mut();
            if let Some(slot) = recorded.get_mut(self.index) {
                if slot.is_none() {
                    *slot = Some(self.pages.current());
                }
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn opaque_images_are_untouched() {
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(2, 2, Rgb([10, 20, 30])));
        let flattened = flatten_alpha(image.clone());
        assert_eq!(flattened.to_rgb8(), image.to_rgb8());
    }

    #[test]
    fn transparency_is_composited_on_white() {
        let mut rgba = RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([0, 0, 0, 255]));
        let flattened = flatten_alpha(DynamicImage::ImageRgba8(rgba));

        assert!(!flattened.color().has_alpha());
        let rgb = flattened.to_rgb8();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(rgb.get_pixel(1, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn missing_image_is_decode_error() {
        let err = decode_image_from_path("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, AppendixError::ImageDecode { .. }));
    }

    #[test]
    fn group_moves_when_rest_of_page_is_too_short() {
        let page = mm_from_f64(247.0);
        assert!(needs_new_page(mm_from_f64(120.0), mm_from_f64(40.0), page));
        assert!(!needs_new_page(mm_from_f64(30.0), mm_from_f64(40.0), page));
        assert!(!needs_new_page(mm_from_f64(40.0), mm_from_f64(40.0), page));
    }

    #[test]
    fn group_taller_than_a_page_stays_put() {
        let page = mm_from_f64(247.0);
        assert!(!needs_new_page(mm_from_f64(300.0), mm_from_f64(40.0), page));
        assert!(needs_new_page(page, mm_from_f64(40.0), page));
    }

    #[test]
    fn short_title_takes_one_line() {
        assert_eq!(title_line_count(50.0, 170.0), 1.0);
        assert_eq!(title_line_count(0.0, 170.0), 1.0);
        assert_eq!(title_line_count(170.0, 170.0), 1.0);
    }

    #[test]
    fn wrapped_title_reserves_an_extra_line() {
        // 180 mm of text in 170 mm wraps at least once, and word breaks can force a third line.
        assert_eq!(title_line_count(180.0, 170.0), 3.0);
        assert_eq!(title_line_count(400.0, 170.0), 4.0);
    }

    #[test]
    fn zero_width_area_counts_one_line() {
        assert_eq!(title_line_count(100.0, 0.0), 1.0);
    }

    #[test]
    fn mm_helpers_round_trip() {
        assert!((mm_to_f64(mm_from_f64(12.5)) - 12.5).abs() < 1e-9);
    }
}
