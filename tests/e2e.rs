//! End-to-end tests for the PDF operations.
//!
//! These need the pdfium shared library. They never download it: each test
//! prints SKIP and returns unless a library is already available locally,
//! through `PDFIUM_LIB_PATH` or the pdfium-auto cache.
//!
//! Run with:
//!   PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   PDFIUM_LIB_PATH=... cargo test --test e2e round_trip -- --nocapture

use image::{GenericImageView, Rgb, RgbImage};
use imgpdf::{
    zip_outputs, Artifacts, ConversionEngine, ConversionRequest, ConvertError, EngineConfig,
    ErrorKind, Operation, PageSelection, PdfiumSource, TargetFormat,
};
use std::path::{Path, PathBuf};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Return an `EngineConfigBuilder` bound to the local pdfium library, or skip
/// the test when there is none.
macro_rules! pdfium_or_skip {
    () => {{
        match pdfium_auto::find_local_library() {
            Some(path) => EngineConfig::builder().pdfium(PdfiumSource::Library(path)),
            None => {
                println!("SKIP: no local pdfium library");
                println!("       Set PDFIUM_LIB_PATH=/path/to/libpdfium to run PDF tests");
                return;
            }
        }
    }};
}

fn save(dir: &Path, name: &str, w: u32, h: u32, format: image::ImageFormat) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_fn(w, h, |x, y| Rgb([(x * 3) as u8, (y * 3) as u8, 90]))
        .save_with_format(&path, format)
        .unwrap();
    path
}

/// Assert `(w, h)` within one pixel of `expected`; pdfium rounds page sizes.
fn assert_size_close(actual: (u32, u32), expected: (u32, u32), context: &str) {
    let close = |a: u32, b: u32| a.abs_diff(b) <= 1;
    assert!(
        close(actual.0, expected.0) && close(actual.1, expected.1),
        "[{context}] expected ~{expected:?}, got {actual:?}"
    );
}

/// Build a PDF with one page per `(w, h)` and return its path.
fn make_pdf(engine: &ConversionEngine, dir: &Path, name: &str, sizes: &[(u32, u32)]) -> PathBuf {
    let images: Vec<PathBuf> = sizes
        .iter()
        .enumerate()
        .map(|(i, &(w, h))| {
            save(
                dir,
                &format!("{name}_src_{i}.png"),
                w,
                h,
                image::ImageFormat::Png,
            )
        })
        .collect();
    let out = dir.join(format!("{name}.pdf"));
    engine.images_to_pdf(images.as_slice(), &out).unwrap();
    out
}

// ── images_to_pdf ────────────────────────────────────────────────────────────

#[test]
fn images_to_pdf_png_and_jpg_in_order() {
    let engine = ConversionEngine::new(pdfium_or_skip!().build().unwrap());
    let dir = tempfile::tempdir().unwrap();
    let a = save(dir.path(), "a.png", 40, 20, image::ImageFormat::Png);
    let b = save(dir.path(), "b.jpg", 30, 60, image::ImageFormat::Jpeg);
    let out = dir.path().join("out.pdf");

    let result = engine.images_to_pdf(&[&a, &b], &out).unwrap();

    assert_eq!(result.artifacts, Artifacts::Single(out.clone()));
    assert_eq!(result.total_pages(), 2);
    assert!(!dir.path().join("out.pdf.tmp").exists());

    let info = engine.inspect(&out).unwrap();
    assert_eq!(info.page_count, 2);

    // Page geometry follows the images, so order is visible after rasterising.
    let pages = dir.path().join("pages");
    let rendered = engine
        .pdf_to_images(&out, &pages, TargetFormat::Png)
        .unwrap();
    let paths = rendered.artifacts.paths();
    assert_eq!(paths.len(), 2);
    assert_size_close(image::open(paths[0]).unwrap().dimensions(), (40, 20), "page a");
    assert_size_close(image::open(paths[1]).unwrap().dimensions(), (30, 60), "page b");
}

#[test]
fn images_to_pdf_page_count_equals_input_count() {
    let engine = ConversionEngine::new(pdfium_or_skip!().build().unwrap());
    let dir = tempfile::tempdir().unwrap();
    for n in [1usize, 3, 7] {
        let sizes: Vec<(u32, u32)> = (0..n).map(|i| (10 + i as u32, 12)).collect();
        let pdf = make_pdf(&engine, dir.path(), &format!("doc{n}"), &sizes);
        assert_eq!(engine.inspect(&pdf).unwrap().page_count, n);
    }
}

// ── pdf_to_images ────────────────────────────────────────────────────────────

#[test]
fn pdf_to_images_one_file_per_page_with_page_names() {
    let engine = ConversionEngine::new(pdfium_or_skip!().build().unwrap());
    let dir = tempfile::tempdir().unwrap();
    let pdf = make_pdf(&engine, dir.path(), "report", &[(20, 20), (20, 20), (20, 20)]);
    let out = dir.path().join("jpgs");

    let result = engine.pdf_to_images(&pdf, &out, TargetFormat::Jpg).unwrap();

    assert_eq!(
        result.artifacts,
        Artifacts::Many(vec![
            out.join("report_page_1.jpg"),
            out.join("report_page_2.jpg"),
            out.join("report_page_3.jpg"),
        ])
    );
    assert_eq!(result.inputs[0].pages, 3);
    for path in result.artifacts.paths() {
        assert!(path.is_file(), "{}", path.display());
    }
}

#[test]
fn round_trip_keeps_page_count() {
    let engine = ConversionEngine::new(pdfium_or_skip!().build().unwrap());
    let dir = tempfile::tempdir().unwrap();
    let images: Vec<PathBuf> = (0..4)
        .map(|i| save(dir.path(), &format!("img{i}.jpg"), 16, 24, image::ImageFormat::Jpeg))
        .collect();
    let pdf = dir.path().join("round.pdf");

    engine.images_to_pdf(images.as_slice(), &pdf).unwrap();
    let pages = engine
        .pdf_to_images(&pdf, dir.path().join("back"), TargetFormat::Png)
        .unwrap();

    assert_eq!(pages.artifacts.len(), images.len());
}

#[test]
fn dpi_scales_rendered_pages() {
    let builder = pdfium_or_skip!();
    let dir = tempfile::tempdir().unwrap();
    let engine = ConversionEngine::new(builder.dpi(144).build().unwrap());
    let pdf = make_pdf(&engine, dir.path(), "hi", &[(50, 30)]);

    let result = engine
        .pdf_to_images(&pdf, dir.path().join("hi"), TargetFormat::Png)
        .unwrap();
    let dims = image::open(result.artifacts.paths()[0]).unwrap().dimensions();
    assert_size_close(dims, (100, 60), "144 dpi");
}

#[test]
fn page_selection_and_subfolder() {
    let builder = pdfium_or_skip!();
    let engine = ConversionEngine::new(
        builder
            .pages(PageSelection::Set(vec![3, 1]))
            .page_subfolder(true)
            .build()
            .unwrap(),
    );
    let dir = tempfile::tempdir().unwrap();
    let pdf = make_pdf(&engine, dir.path(), "book", &[(10, 10), (10, 10), (10, 10)]);
    let out = dir.path().join("out");

    let result = engine.pdf_to_images(&pdf, &out, TargetFormat::Png).unwrap();
    assert_eq!(
        result.artifacts,
        Artifacts::Many(vec![
            out.join("book/book_page_1.png"),
            out.join("book/book_page_3.png"),
        ])
    );

    let err = ConversionEngine::new(
        pdfium_or_skip!()
            .pages(PageSelection::Single(9))
            .build()
            .unwrap(),
    )
    .pdf_to_images(&pdf, &out, TargetFormat::Png)
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn pdf_to_images_processes_every_pdf_input() {
    let engine = ConversionEngine::new(pdfium_or_skip!().build().unwrap());
    let dir = tempfile::tempdir().unwrap();
    let one = make_pdf(&engine, dir.path(), "one", &[(10, 10)]);
    let two = make_pdf(&engine, dir.path(), "two", &[(10, 10), (10, 10)]);
    let out = dir.path().join("all");

    let request = ConversionRequest::infer([&one, &two], TargetFormat::Png, &out).unwrap();
    assert_eq!(request.operation, Operation::PdfToImages);
    let result = engine.execute(&request).unwrap();

    assert_eq!(result.artifacts.len(), 3);
    assert_eq!(result.inputs[0].outputs, vec![out.join("one_page_1.png")]);
    assert_eq!(result.inputs[1].pages, 2);
}

#[test]
fn same_named_pdfs_are_listed_once() {
    let engine = ConversionEngine::new(pdfium_or_skip!().build().unwrap());
    let dir = tempfile::tempdir().unwrap();
    let left = dir.path().join("left");
    let right = dir.path().join("right");
    std::fs::create_dir_all(&left).unwrap();
    std::fs::create_dir_all(&right).unwrap();
    let a = make_pdf(&engine, &left, "scan", &[(10, 10)]);
    let b = make_pdf(&engine, &right, "scan", &[(10, 10), (10, 10)]);
    let out = dir.path().join("flat");

    let request = ConversionRequest::infer([&a, &b], TargetFormat::Png, &out).unwrap();
    let result = engine.execute(&request).unwrap();

    assert_eq!(
        result.artifacts,
        Artifacts::Many(vec![out.join("scan_page_1.png"), out.join("scan_page_2.png")])
    );
    assert_eq!(result.inputs[1].pages, 2);
}

// ── merge_pdfs ───────────────────────────────────────────────────────────────

#[test]
fn merge_concatenates_in_input_order() {
    let engine = ConversionEngine::new(pdfium_or_skip!().build().unwrap());
    let dir = tempfile::tempdir().unwrap();
    let first = make_pdf(&engine, dir.path(), "first", &[(10, 40), (10, 40)]);
    let second = make_pdf(&engine, dir.path(), "second", &[(40, 10)]);
    let merged = dir.path().join("merged.pdf");

    let result = engine.merge_pdfs(&[&first, &second], &merged).unwrap();
    assert_eq!(result.artifacts, Artifacts::Single(merged.clone()));
    assert_eq!(result.total_pages(), 3);
    assert_eq!(engine.inspect(&merged).unwrap().page_count, 3);

    let pages = engine
        .pdf_to_images(&merged, dir.path().join("m"), TargetFormat::Png)
        .unwrap();
    let last = image::open(pages.artifacts.paths()[2]).unwrap().dimensions();
    assert_size_close(last, (40, 10), "page from second input");
}

#[test]
fn merge_rejects_a_non_pdf_and_writes_nothing() {
    let engine = ConversionEngine::new(pdfium_or_skip!().build().unwrap());
    let dir = tempfile::tempdir().unwrap();
    let good = make_pdf(&engine, dir.path(), "good", &[(10, 10)]);
    let fake = dir.path().join("fake.pdf");
    std::fs::write(&fake, b"GIF89a not a pdf").unwrap();
    let merged = dir.path().join("merged.pdf");

    let err = engine.merge_pdfs(&[&good, &fake], &merged).unwrap_err();
    match err {
        ConvertError::NotAPdf { path, magic } => {
            assert_eq!(path, fake);
            assert_eq!(&magic, b"GIF8");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!merged.exists());
}

// ── inspect / archive ────────────────────────────────────────────────────────

#[test]
fn inspect_reports_version_and_page_count() {
    let engine = ConversionEngine::new(pdfium_or_skip!().build().unwrap());
    let dir = tempfile::tempdir().unwrap();
    let pdf = make_pdf(&engine, dir.path(), "meta", &[(10, 10), (10, 10)]);

    let info = engine.inspect(&pdf).unwrap();
    assert_eq!(info.path, pdf);
    assert_eq!(info.page_count, 2);
    assert!(!info.pdf_version.is_empty());
}

#[test]
fn rasterised_pages_can_be_zipped() {
    let engine = ConversionEngine::new(pdfium_or_skip!().build().unwrap());
    let dir = tempfile::tempdir().unwrap();
    let pdf = make_pdf(&engine, dir.path(), "zipme", &[(10, 10), (10, 10)]);
    let result = engine
        .pdf_to_images(&pdf, dir.path().join("z"), TargetFormat::Png)
        .unwrap();

    let zip_path = dir.path().join("z.zip");
    let written = zip_outputs(result.artifacts.paths().as_slice(), &zip_path).unwrap();
    assert_eq!(written, 2);
    assert!(zip_path.is_file());
}
