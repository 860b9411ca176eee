//! Logical content of the appendix document.
//!
//! A [`ContentStream`] is an append-only list of [`Block`]s produced by
//! [`crate::appendix::assemble`] and consumed once by the renderer in
//! [`crate::builder`].  The blocks do not reference the rendering crate so the
//! assembled order can be inspected and tested without fonts.

use crate::fit::FittedImage;

/// Heading levels used by the appendix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeadingLevel {
    /// Document title.
    Title,
    /// Feature folder heading.
    Feature,
    /// Diagram title inside a [`DiagramBlock`].
    Diagram,
}

/// A single line heading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heading {
    level: HeadingLevel,
    text: String,
}

impl Heading {
    pub fn new(level: HeadingLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    pub fn level(&self) -> HeadingLevel {
        self.level
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A diagram title and image that must stay on the same page.
#[derive(Clone, Debug, PartialEq)]
pub struct DiagramBlock {
    title: Heading,
    image: FittedImage,
}

impl DiagramBlock {
    pub fn new(title: impl Into<String>, image: FittedImage) -> Self {
        Self {
            title: Heading::new(HeadingLevel::Diagram, title),
            image,
        }
    }

    pub fn title(&self) -> &Heading {
        &self.title
    }

    pub fn image(&self) -> &FittedImage {
        &self.image
    }
}

/// Individual content blocks, in reading order.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    /// Title or feature heading.
    Heading(Heading),
    /// Body text paragraph.
    Paragraph(String),
    /// Vertical gap, in millimetres.
    Spacer(f64),
    /// Title and image kept together.
    Diagram(DiagramBlock),
}

impl Block {
    /// Convenience helper for building a heading block.
    pub fn heading(level: HeadingLevel, text: impl Into<String>) -> Self {
        Self::Heading(Heading::new(level, text))
    }

    /// Convenience helper for building a paragraph block.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph(text.into())
    }
}

/// Ordered, append-only sequence of blocks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContentStream {
    blocks: Vec<Block>,
}

impl ContentStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a block at the end of the stream.
    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterates over the feature headings in stream order.
    pub fn feature_headings(&self) -> impl Iterator<Item = &Heading> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Heading(heading) if heading.level() == HeadingLevel::Feature => Some(heading),
            _ => None,
        })
    }

    /// Iterates over the diagram blocks in stream order.
    pub fn diagrams(&self) -> impl Iterator<Item = &DiagramBlock> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Diagram(diagram) => Some(diagram),
            _ => None,
        })
    }
}

impl IntoIterator for ContentStream {
    type Item = Block;
    type IntoIter = std::vec::IntoIter<Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.into_iter()
    }
}
