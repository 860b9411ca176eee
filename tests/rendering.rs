use std::fs;
use std::path::Path;

use diagram_appendix::appendix::assemble;
use diagram_appendix::builder::{render, RenderedPdf};
use diagram_appendix::discovery::discover_features;
use diagram_appendix::{fonts, generate, AppendixConfig};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::content::Content;
use lopdf::{Document, Object};
use sha2::{Digest, Sha256};
use tempfile::TempDir;

/// A4 height and the 25 mm top/bottom margin, in points.
const PAGE_HEIGHT_PT: f64 = 841.89;
const MARGIN_PT: f64 = 70.87;

const SKIP_HINT: &str = "fonts missing. Set APPENDIX_FONTS_DIR to a directory with LiberationSans.";

fn write_png(path: &Path, width: u32, height: u32) {
    RgbImage::from_pixel(width, height, Rgb([30, 90, 160]))
        .save(path)
        .expect("write fixture png");
}

fn sample_tree() -> TempDir {
    let tmp = TempDir::new().expect("create temp dir");
    let login = tmp.path().join("System Feature 1: Login");
    let upload = tmp.path().join("System Feature 2: Upload");
    let empty = tmp.path().join("System Feature 3: Reporting");
    for folder in [&login, &upload, &empty] {
        fs::create_dir(folder).expect("create feature folder");
    }

    write_png(&login.join("Activity Diagram.png"), 400, 200);
    write_png(&login.join("Class Diagram.png"), 100, 100);

    let mut transparent = RgbaImage::new(300, 120);
    for pixel in transparent.pixels_mut() {
        *pixel = Rgba([0, 0, 0, 64]);
    }
    transparent
        .save(upload.join("Sequence Diagram.png"))
        .expect("write transparent png");

    tmp
}

fn render_tree(root: &Path, config: &AppendixConfig) -> Option<RenderedPdf> {
    if !fonts::default_fonts_available() {
        return None;
    }

    let features = discover_features(root, config.naming()).expect("discover features");
    let stream = assemble(&features, config).expect("assemble content");
    Some(render(stream, config).expect("render appendix"))
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() && data[cursor] != terminator {
                    if terminator == b')'
                        || !matches!(data[cursor], b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t')
                    {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while let Some(start_pos) = data[offset..]
            .windows(start.len())
            .position(|window| window == start)
        {
            let start_index = offset + start_pos + start.len();
            let Some(end_pos) = data[start_index..]
                .windows(end.len())
                .position(|window| window == end)
            else {
                break;
            };
            for byte in &mut data[start_index..start_index + end_pos] {
                if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                    *byte = b'0';
                }
            }
            offset = start_index + end_pos + end.len();
        }
    }

    let mut normalized = bytes.to_vec();
    let literal_tags: [&[u8]; 3] = [b"/CreationDate(", b"/ModDate(", b"/Producer("];
    for tag in literal_tags {
        scrub_segment(&mut normalized, tag, b')');
    }
    scrub_segment(&mut normalized, b"/ID[", b']');
    let xml_tags: [(&[u8], &[u8]); 6] = [
        (b"<xmp:CreateDate>", b"</xmp:CreateDate>"),
        (b"<xmp:ModifyDate>", b"</xmp:ModifyDate>"),
        (b"<xmp:MetadataDate>", b"</xmp:MetadataDate>"),
        (b"<xmpMM:DocumentID>", b"</xmpMM:DocumentID>"),
        (b"<xmpMM:InstanceID>", b"</xmpMM:InstanceID>"),
        (b"<xmpMM:VersionID>", b"</xmpMM:VersionID>"),
    ];
    for (start, end) in xml_tags {
        scrub_xml(&mut normalized, start, end);
    }
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(scrub_pdf(bytes)).into()
}

fn number(object: &Object) -> f64 {
    match object {
        Object::Integer(value) => *value as f64,
        Object::Real(value) => *value as f64,
        other => panic!("expected a number, got {other:?}"),
    }
}

type Matrix = [f64; 6];

fn concat(m: &Matrix, n: &Matrix) -> Matrix {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

/// Page number and vertical extent, in points, of every image drawn in the document.
fn image_placements(bytes: &[u8]) -> Vec<(u32, f64, f64)> {
    let document = Document::load_mem(bytes).expect("parse rendered pdf");
    let mut placements = Vec::new();

    for (page_number, page_id) in document.get_pages() {
        let raw = document.get_page_content(page_id).expect("read page content");
        let content = Content::decode(&raw).expect("decode page content");
        let mut stack = Vec::new();
        let mut ctm: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

        for operation in &content.operations {
            match operation.operator.as_str() {
                "q" => stack.push(ctm),
                "Q" => ctm = stack.pop().unwrap_or([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]),
                "cm" => {
                    let values: Vec<f64> = operation.operands.iter().map(number).collect();
                    let matrix: Matrix = values.try_into().expect("cm has six operands");
                    ctm = concat(&matrix, &ctm);
                }
                "Do" => {
                    let corners = [
                        ctm[5],
                        ctm[1] + ctm[5],
                        ctm[3] + ctm[5],
                        ctm[1] + ctm[3] + ctm[5],
                    ];
                    let bottom = corners.iter().copied().fold(f64::INFINITY, f64::min);
                    let top = corners.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    placements.push((page_number, bottom, top));
                }
                _ => {}
            }
        }
    }

    placements
}

fn assert_images_inside_margins(placements: &[(u32, f64, f64)]) {
    for (page, bottom, top) in placements {
        assert!(
            *bottom >= MARGIN_PT - 1.0 && *top <= PAGE_HEIGHT_PT - MARGIN_PT + 1.0,
            "image on page {page} spans {bottom:.1}..{top:.1} pt, outside the margins"
        );
    }
}

/// Pixel sizes of the embedded image objects, sorted.
fn image_sizes(bytes: &[u8]) -> Vec<(i64, i64)> {
    let document = Document::load_mem(bytes).expect("parse rendered pdf");
    let mut sizes: Vec<(i64, i64)> = document
        .objects
        .values()
        .filter_map(|object| match object {
            Object::Stream(stream) => Some(&stream.dict),
            _ => None,
        })
        .filter(|dict| {
            dict.get(b"Subtype")
                .and_then(Object::as_name)
                .map(|name| name == b"Image")
                .unwrap_or(false)
        })
        .map(|dict| {
            let width = dict.get(b"Width").and_then(Object::as_i64).expect("image width");
            let height = dict.get(b"Height").and_then(Object::as_i64).expect("image height");
            (width, height)
        })
        .collect();
    sizes.sort_unstable();
    sizes
}

#[test]
fn renders_pdf_with_feature_pages() {
    let tree = sample_tree();
    let Some(pdf) = render_tree(tree.path(), &AppendixConfig::default()) else {
        eprintln!("Skipping renders_pdf_with_feature_pages: {SKIP_HINT}");
        return;
    };

    assert!(pdf.bytes.starts_with(b"%PDF"));
    assert!(pdf.page_count >= 1);
    let titles: Vec<_> = pdf.feature_pages.iter().map(|f| f.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "System Feature 1: Login",
            "System Feature 2: Upload",
            "System Feature 3: Reporting"
        ]
    );
    assert!(pdf.feature_pages.iter().all(|f| f.page.is_some()));
    assert_eq!(pdf.feature_pages[0].page, Some(1));
}

#[test]
fn tall_diagrams_move_to_their_own_pages() {
    let tmp = TempDir::new().expect("create temp dir");
    let folder = tmp.path().join("System Feature 1: Tall");
    fs::create_dir(&folder).expect("create feature folder");
    for name in ["a.png", "b.png", "c.png"] {
        write_png(&folder.join(name), 200, 2000);
    }

    let Some(pdf) = render_tree(tmp.path(), &AppendixConfig::default()) else {
        eprintln!("Skipping tall_diagrams_move_to_their_own_pages: {SKIP_HINT}");
        return;
    };

    // Each diagram is clamped to the maximum height, so no two fit on one page.
    assert!(pdf.page_count >= 3, "got {} page(s)", pdf.page_count);

    let placements = image_placements(&pdf.bytes);
    assert_eq!(placements.len(), 3);
    let mut pages: Vec<u32> = placements.iter().map(|(page, _, _)| *page).collect();
    pages.dedup();
    assert_eq!(pages.len(), 3, "diagrams share a page: {placements:?}");
    assert_images_inside_margins(&placements);
}

#[test]
fn diagram_title_near_page_bottom_moves_with_its_image() {
    let tmp = TempDir::new().expect("create temp dir");
    let folder = tmp.path().join("System Feature 1: Mixed");
    fs::create_dir(&folder).expect("create feature folder");
    // About 197 mm, then about 106 mm: the second group only fits on a fresh page.
    write_png(&folder.join("a.png"), 200, 2000);
    write_png(&folder.join("b.png"), 300, 300);

    let Some(pdf) = render_tree(tmp.path(), &AppendixConfig::default()) else {
        eprintln!("Skipping diagram_title_near_page_bottom_moves_with_its_image: {SKIP_HINT}");
        return;
    };

    let placements = image_placements(&pdf.bytes);
    assert_eq!(placements.len(), 2);
    assert_ne!(placements[0].0, placements[1].0, "{placements:?}");
    assert_images_inside_margins(&placements);
}

#[test]
fn text_only_rendering_is_deterministic() {
    let tmp = TempDir::new().expect("create temp dir");
    for name in ["System Feature 1: Login", "System Feature 2: Upload"] {
        fs::create_dir(tmp.path().join(name)).expect("create feature folder");
    }
    let config = AppendixConfig::default();
    let Some(first) = render_tree(tmp.path(), &config) else {
        eprintln!("Skipping text_only_rendering_is_deterministic: {SKIP_HINT}");
        return;
    };
    let Some(second) = render_tree(tmp.path(), &config) else {
        return;
    };

    assert_eq!(first.bytes.len(), second.bytes.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&first.bytes),
        normalized_hash(&second.bytes),
        "PDF renders must be deterministic after metadata normalization"
    );
}

#[test]
fn diagram_rendering_is_structurally_stable() {
    let tree = sample_tree();
    let config = AppendixConfig::default();
    let Some(first) = render_tree(tree.path(), &config) else {
        eprintln!("Skipping diagram_rendering_is_structurally_stable: {SKIP_HINT}");
        return;
    };
    let Some(second) = render_tree(tree.path(), &config) else {
        return;
    };

    assert_eq!(first.page_count, second.page_count);
    assert_eq!(first.feature_pages, second.feature_pages);
    assert_eq!(image_sizes(&first.bytes), image_sizes(&second.bytes));
    assert_eq!(image_sizes(&first.bytes), vec![(100, 100), (300, 120), (400, 200)]);
}

#[test]
fn generate_overwrites_existing_output() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping generate_overwrites_existing_output: {SKIP_HINT}");
        return;
    }

    let tree = sample_tree();
    let out_dir = TempDir::new().expect("create output dir");
    let output = out_dir.path().join("appendix.pdf");
    fs::write(&output, b"stale").expect("write stale output");

    let config = AppendixConfig::default().with_output_path(&output);
    let generated = generate(tree.path(), &config).expect("generate appendix");

    let written = fs::read(&output).expect("read output");
    assert_eq!(generated.output_path, output);
    assert_eq!(generated.bytes_written, written.len());
    assert!(written.starts_with(b"%PDF"));

    #[cfg(feature = "bookmarks")]
    assert!(written.windows(b"/Outlines".len()).any(|w| w == b"/Outlines"));
}
