//! The appendix pipeline: discover feature folders, fit their diagrams, lay out the content
//! stream, render it and write the result.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::builder::{self, FeaturePage};
use crate::config::AppendixConfig;
use crate::discovery::{self, FeatureFolder};
use crate::error::AppendixError;
use crate::fit::FittedImage;
use crate::model::{Block, ContentStream, DiagramBlock, HeadingLevel};

/// Title shown above a diagram: its 1-based position and file stem.
pub fn diagram_title(index: usize, path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}. {}", index, stem)
}

/// Builds the content stream for the given, already ordered, feature folders.
///
/// Every diagram is probed for its pixel size, so unreadable images fail here before any
/// rendering starts.
pub fn assemble(
    features: &[FeatureFolder],
    config: &AppendixConfig,
) -> Result<ContentStream, AppendixError> {
    let spacer = config.spacer_mm();
    let bounds = config.fit_bounds();
    let mut stream = ContentStream::new();

    stream.push(Block::heading(HeadingLevel::Title, config.title()));
    stream.push(Block::Spacer(spacer));
    stream.push(Block::paragraph(config.introduction()));
    stream.push(Block::Spacer(spacer));

    for feature in features {
        stream.push(Block::heading(HeadingLevel::Feature, feature.title()));

        for (index, path) in feature.diagrams().iter().enumerate() {
            let fitted = FittedImage::probe(path, bounds)?;
            if index == 0 {
                stream.push(Block::Spacer(spacer));
            }
            stream.push(Block::Diagram(DiagramBlock::new(
                diagram_title(index + 1, path),
                fitted,
            )));
            stream.push(Block::Spacer(spacer));
        }
    }

    Ok(stream)
}

/// Summary of a completed run.
#[derive(Clone, Debug)]
pub struct GeneratedAppendix {
    pub output_path: PathBuf,
    pub bytes_written: usize,
    pub page_count: usize,
    pub feature_pages: Vec<FeaturePage>,
}

/// Runs the whole pipeline for the feature folders below `root`.
///
/// The document is rendered in memory and only written once complete, replacing any existing file
/// at the configured output path.  Any failure leaves the output path untouched.
pub fn generate(
    root: impl AsRef<Path>,
    config: &AppendixConfig,
) -> Result<GeneratedAppendix, AppendixError> {
    let features = discovery::discover_features(root, config.naming())?;
    let stream = assemble(&features, config)?;
    info!(
        "Assembled {} block(s) with {} diagram(s)",
        stream.len(),
        stream.diagrams().count()
    );

    let rendered = builder::render(stream, config)?;

    #[cfg(feature = "bookmarks")]
    let bytes =
        crate::bookmarks::apply_feature_bookmarks(&rendered.bytes, &rendered.feature_pages)?;
    #[cfg(not(feature = "bookmarks"))]
    let bytes = rendered.bytes;

    let output_path = config.output_path().to_path_buf();
    fs::write(&output_path, &bytes).map_err(|source| AppendixError::Write {
        path: output_path.clone(),
        source,
    })?;
    info!("Wrote {} ({} bytes)", output_path.display(), bytes.len());

    Ok(GeneratedAppendix {
        output_path,
        bytes_written: bytes.len(),
        page_count: rendered.page_count,
        feature_pages: rendered.feature_pages,
    })
}
