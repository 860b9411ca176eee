//! Document outline for feature headings, embedded with `lopdf`.

use std::collections::BTreeMap;
use std::fmt;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::builder::FeaturePage;

/// Errors that can occur while embedding the outline into a rendered PDF document.
#[derive(Debug)]
pub enum BookmarkError {
    /// The PDF bytes could not be parsed or serialized by `lopdf`.
    Parse(lopdf::Error),
    /// The trailer has no usable `/Root` catalog reference.
    MissingCatalog,
    /// The catalog object was not a dictionary.
    InvalidCatalog,
    /// A feature heading was recorded on a page the document does not contain.
    MissingPage { feature: String, page: usize },
}

impl From<lopdf::Error> for BookmarkError {
    fn from(err: lopdf::Error) -> Self {
        Self::Parse(err)
    }
}

impl From<std::io::Error> for BookmarkError {
    fn from(err: std::io::Error) -> Self {
        Self::Parse(err.into())
    }
}

impl fmt::Display for BookmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "Failed to process PDF bytes: {err}"),
            Self::MissingCatalog => write!(f, "PDF catalog entry is missing"),
            Self::InvalidCatalog => write!(f, "PDF catalog entry is not a dictionary"),
            Self::MissingPage { feature, page } => write!(
                f,
                "Feature '{}' refers to missing page {} for its bookmark",
                feature, page
            ),
        }
    }
}

impl std::error::Error for BookmarkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::MissingCatalog | Self::InvalidCatalog | Self::MissingPage { .. } => None,
        }
    }
}

struct OutlineItem {
    id: ObjectId,
    page: ObjectId,
    title: String,
}

/// Adds a flat `/Outlines` tree with one entry per feature, each opening its heading's page.
///
/// Features that were never drawn are skipped.  Without any drawable feature the input bytes are
/// returned unchanged.
pub fn apply_feature_bookmarks(
    pdf_bytes: &[u8],
    features: &[FeaturePage],
) -> Result<Vec<u8>, BookmarkError> {
    let mut document = Document::load_mem(pdf_bytes)?;
    let pages = document.get_pages();

    let items = outline_items(&mut document, features, &pages)?;
    if items.is_empty() {
        return Ok(pdf_bytes.to_vec());
    }

    let root_id = document.new_object_id();
    for (index, item) in items.iter().enumerate() {
        let mut entry = Dictionary::new();
        entry.set("Title", Object::string_literal(item.title.as_str()));
        entry.set(
            "Dest",
            Object::Array(vec![Object::Reference(item.page), Object::Name("Fit".into())]),
        );
        entry.set("Parent", Object::Reference(root_id));
        if let Some(previous) = index.checked_sub(1).and_then(|i| items.get(i)) {
            entry.set("Prev", Object::Reference(previous.id));
        }
        if let Some(next) = items.get(index + 1) {
            entry.set("Next", Object::Reference(next.id));
        }
        document.objects.insert(item.id, Object::Dictionary(entry));
    }

    let mut root = Dictionary::new();
    root.set("Type", Object::Name("Outlines".into()));
    root.set("Count", Object::Integer(items.len() as i64));
    if let (Some(first), Some(last)) = (items.first(), items.last()) {
        root.set("First", Object::Reference(first.id));
        root.set("Last", Object::Reference(last.id));
    }
    document.objects.insert(root_id, Object::Dictionary(root));

    let catalog_id = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| BookmarkError::MissingCatalog)?;
    document
        .objects
        .get_mut(&catalog_id)
        .ok_or(BookmarkError::MissingCatalog)?
        .as_dict_mut()
        .map_err(|_| BookmarkError::InvalidCatalog)?
        .set("Outlines", Object::Reference(root_id));

    let mut buffer = Vec::new();
    document.save_to(&mut buffer)?;
    Ok(buffer)
}

fn outline_items(
    document: &mut Document,
    features: &[FeaturePage],
    pages: &BTreeMap<u32, ObjectId>,
) -> Result<Vec<OutlineItem>, BookmarkError> {
    let mut items = Vec::new();

    for feature in features {
        let Some(page) = feature.page else {
            continue;
        };
        let page_ref = u32::try_from(page)
            .ok()
            .and_then(|number| pages.get(&number))
            .copied()
            .ok_or_else(|| BookmarkError::MissingPage {
                feature: feature.title.clone(),
                page,
            })?;

        items.push(OutlineItem {
            id: document.new_object_id(),
            page: page_ref,
            title: feature.title.clone(),
        });
    }

    Ok(items)
}
