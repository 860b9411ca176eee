//! Document construction and rendering for the diagram appendix.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use genpdf::elements::Paragraph;
use genpdf::error::Error;
use genpdf::style;
use genpdf::{self, Margins, PageDecorator, Size};
use log::info;

use crate::config::AppendixConfig;
use crate::elements::{heading_element, mm_from_f64, DiagramGroup, PageTracked, Spacer};
use crate::error::AppendixError;
use crate::fonts;
use crate::model::{Block, ContentStream, HeadingLevel};

/// Shared 1-based number of the page currently being laid out.
#[derive(Clone, Debug, Default)]
pub struct PageCounter(Rc<Cell<usize>>);

impl PageCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of the current page, `0` before the first page is started.
    pub fn current(&self) -> usize {
        self.0.get()
    }

    fn advance(&self) {
        self.0.set(self.0.get() + 1);
    }
}

/// Builder for `genpdf::Document` instances pre-configured for the appendix.
#[derive(Default)]
pub struct DocumentBuilder {
    paper_size: Option<Size>,
    margins: Option<Margins>,
    title: Option<String>,
    font_size: Option<u8>,
    pages: PageCounter,
}

impl DocumentBuilder {
    /// Creates a new builder instance with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the paper size used for newly created documents.
    pub fn with_paper_size(mut self, paper_size: impl Into<Size>) -> Self {
        self.paper_size = Some(paper_size.into());
        self
    }

    /// Sets the margins applied through the page decorator.
    pub fn with_margins(mut self, margins: impl Into<Margins>) -> Self {
        self.margins = Some(margins.into());
        self
    }

    /// Sets the title stored in the PDF metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the body font size in points.
    pub fn with_font_size(mut self, font_size: u8) -> Self {
        self.font_size = Some(font_size);
        self
    }

    /// Uses `pages` to publish the number of the page being laid out.
    pub fn with_page_counter(mut self, pages: PageCounter) -> Self {
        self.pages = pages;
        self
    }

    /// Builds a fully configured `genpdf::Document` instance.
    pub fn build(self) -> Result<genpdf::Document, AppendixError> {
        let font_family = fonts::default_font_family().map_err(AppendixError::FontLoad)?;
        let mut document = genpdf::Document::new(font_family);

        if let Some(paper_size) = self.paper_size {
            document.set_paper_size(paper_size);
        }
        if let Some(title) = self.title {
            document.set_title(title);
        }
        if let Some(font_size) = self.font_size {
            document.set_font_size(font_size);
        }

        document.set_page_decorator(CountingPageDecorator::new(self.margins, self.pages));
        Ok(document)
    }
}

struct CountingPageDecorator {
    pages: PageCounter,
    margins: Option<Margins>,
}

impl CountingPageDecorator {
    fn new(margins: Option<Margins>, pages: PageCounter) -> Self {
        Self { pages, margins }
    }
}

impl PageDecorator for CountingPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        _context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        _style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        self.pages.advance();

        if let Some(margins) = self.margins {
            area.add_margins(margins);
        }

        Ok(area)
    }
}

/// Page on which a feature heading was placed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeaturePage {
    pub title: String,
    /// 1-based page number, `None` if the heading was never drawn.
    pub page: Option<usize>,
}

/// Output of [`render`].
#[derive(Clone, Debug)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub feature_pages: Vec<FeaturePage>,
}

/// Lays out `stream` on pages described by `config` and serializes the PDF in memory.
pub fn render(stream: ContentStream, config: &AppendixConfig) -> Result<RenderedPdf, AppendixError> {
    let (paper_width, paper_height) = config.paper_size();
    let margins = config.margins();
    let pages = PageCounter::new();

    let mut document = DocumentBuilder::new()
        .with_paper_size(Size::new(mm_from_f64(paper_width), mm_from_f64(paper_height)))
        .with_margins(Margins::trbl(
            mm_from_f64(margins.top),
            mm_from_f64(margins.right),
            mm_from_f64(margins.bottom),
            mm_from_f64(margins.left),
        ))
        .with_title(config.title())
        .with_font_size(config.body_font_size())
        .with_page_counter(pages.clone())
        .build()?;

    let headings = config.headings();
    let page_height = mm_from_f64(config.content_height_mm());
    let recorded = Rc::new(RefCell::new(Vec::new()));
    let mut feature_titles = Vec::new();

    for block in stream {
        match block {
            Block::Heading(heading) if heading.level() == HeadingLevel::Feature => {
                let index = feature_titles.len();
                feature_titles.push(heading.text().to_owned());
                recorded.borrow_mut().push(None);
                document.push(PageTracked::new(
                    heading_element(&heading, headings.feature),
                    pages.clone(),
                    Rc::clone(&recorded),
                    index,
                ));
            }
            Block::Heading(heading) => {
                document.push(heading_element(&heading, headings.for_level(heading.level())))
            }
            Block::Paragraph(text) => document.push(Paragraph::new(text)),
            Block::Spacer(height) => document.push(Spacer::new(height)),
            Block::Diagram(diagram) => {
                document.push(DiagramGroup::new(&diagram, headings.diagram, page_height)?)
            }
        }
    }

    let mut bytes = Vec::new();
    document.render(&mut bytes).map_err(AppendixError::Render)?;

    let feature_pages: Vec<FeaturePage> = feature_titles
        .into_iter()
        .zip(recorded.borrow().iter().copied())
        .map(|(title, page)| FeaturePage { title, page })
        .collect();

    info!(
        "Rendered {} page(s), {} bytes",
        pages.current(),
        bytes.len()
    );

    Ok(RenderedPdf {
        bytes,
        page_count: pages.current(),
        feature_pages,
    })
}
