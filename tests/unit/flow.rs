use std::sync::Mutex;

use pretty_assertions::assert_eq;

use super::*;
use crate::canvas::PageView;
use crate::config::{LayoutKind, PageSpec};
use crate::token::CardSpec;

fn square_pages(dir: &std::path::Path, name: &str, side: f64) -> RunConfig {
    RunConfig::new(dir.join(name)).with_page_size(PageSpec::Dims([side, side]))
}

/// Records the view it was drawn into.
struct Recorder {
    size: Size,
    seen: Mutex<Vec<(Size, crate::foundation::core::Affine)>>,
}

impl Token for Recorder {
    fn footprint(&self) -> Size {
        self.size
    }

    fn draw(&self, view: &mut PageView<'_>) -> TokenpressResult<()> {
        self.seen
            .lock()
            .unwrap()
            .push((view.size(), view.transform()));
        Ok(())
    }
}

#[test]
fn two_cards_on_one_svg_page() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = square_pages(dir.path(), "out.svg", 100.0).with_tokens(vec![
        CardSpec::new(40.0, 40.0).with_label("Goblin"),
        CardSpec::new(30.0, 60.0),
    ]);
    let summary = run(&mut cfg).unwrap();
    assert_eq!(summary.pages, 1);
    assert_eq!(summary.tokens, 2);
    assert_eq!(summary.canvas, "svg(native)");
    assert!(summary.layout.starts_with("Margins(BestOf"));

    let svg = std::fs::read_to_string(dir.path().join("out.svg")).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("Goblin"));
}

#[test]
fn large_cards_get_a_pdf_page_each() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = square_pages(dir.path(), "out.pdf", 100.0)
        .with_tokens(vec![CardSpec::new(90.0, 90.0).with_count(3)]);
    let summary = run(&mut cfg).unwrap();
    assert_eq!(summary.pages, 3);
    assert_eq!(cfg.resolved_canvas.as_deref(), Some("pdf(lopdf)"));

    let doc = lopdf::Document::load(dir.path().join("out.pdf")).unwrap();
    assert_eq!(doc.get_pages().len(), 3);
}

#[test]
fn rotated_view_maps_the_token_corner_into_the_slot() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = RunConfig::new(dir.path().join("out.svg"))
        .with_page_size(PageSpec::Dims([100.0, 50.0]));
    cfg.packing.layout = LayoutKind::Single;
    let recorder = std::sync::Arc::new(Recorder {
        size: Size::new(40.0, 90.0),
        seen: Mutex::new(Vec::new()),
    });

    struct Shared(std::sync::Arc<Recorder>);
    impl Token for Shared {
        fn footprint(&self) -> Size {
            self.0.footprint()
        }
        fn draw(&self, view: &mut PageView<'_>) -> TokenpressResult<()> {
            self.0.draw(view)
        }
    }

    let tokens: Vec<Box<dyn Token>> = vec![Box::new(Shared(recorder.clone()))];
    run_with_tokens(&mut cfg, &tokens).unwrap();

    let seen = recorder.seen.lock().unwrap();
    let (size, transform) = seen[0];
    assert_eq!(size, Size::new(40.0, 90.0));
    // Local (0, 0) lands on the slot's top-right corner, local (40, 90) on its bottom-left.
    let origin = transform * crate::foundation::core::Point::new(0.0, 0.0);
    let far = transform * crate::foundation::core::Point::new(40.0, 90.0);
    assert!((origin.x - 90.0).abs() < 1e-9 && origin.y.abs() < 1e-9, "{origin:?}");
    assert!(far.x.abs() < 1e-9 && (far.y - 40.0).abs() < 1e-9, "{far:?}");
}

#[test]
fn page_margin_keeps_tokens_off_the_edge() {
    let mut cfg = RunConfig::new("out.svg").with_page_size(PageSpec::Dims([100.0, 100.0]));
    cfg.page_margin = 10.0;

    let fits = cards_from_specs(&[CardSpec::new(80.0, 80.0)]);
    let (_, a) = arrange_tokens(&cfg, &fits).unwrap();
    let p = a.pages[0].placements[0];
    assert_eq!((p.x, p.y), (10.0, 10.0));
    assert_eq!(a.pages[0].size, Size::new(100.0, 100.0));

    let too_big = cards_from_specs(&[CardSpec::new(81.0, 81.0)]);
    assert!(matches!(
        arrange_tokens(&cfg, &too_big).unwrap_err(),
        TokenpressError::TokenTooLarge { .. }
    ));
}

#[test]
fn nothing_to_place_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = square_pages(dir.path(), "out.svg", 100.0);
    assert!(matches!(
        run(&mut cfg).unwrap_err(),
        TokenpressError::Validation(_)
    ));
    assert!(!dir.path().join("out.svg").exists());
}

#[test]
fn unknown_format_fails_before_layout() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = square_pages(dir.path(), "out.docx", 100.0)
        .with_tokens(vec![CardSpec::new(500.0, 500.0)]);
    // The oversized card would fail layout; the format error comes first.
    assert!(matches!(
        run(&mut cfg).unwrap_err(),
        TokenpressError::UnsupportedFormat(_)
    ));
    assert!(cfg.resolved_canvas.is_none());
}

#[test]
fn several_svg_pages_need_split_pages() {
    let dir = tempfile::tempdir().unwrap();
    let cards = vec![CardSpec::new(90.0, 90.0).with_count(2)];

    let mut cfg = square_pages(dir.path(), "out.svg", 100.0).with_tokens(cards.clone());
    assert!(matches!(
        run(&mut cfg).unwrap_err(),
        TokenpressError::UnsupportedMultiPage(_)
    ));

    let mut cfg = square_pages(dir.path(), "out.svg", 100.0)
        .with_tokens(cards)
        .with_split_pages(true);
    run(&mut cfg).unwrap();
    assert!(dir.path().join("out_0.svg").is_file());
    assert!(dir.path().join("out_1.svg").is_file());
    assert!(!dir.path().join("out.svg").exists());
}
