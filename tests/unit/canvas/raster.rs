use super::*;

const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="25.4mm" height="12.7mm" viewBox="0 0 25.4 12.7"><rect x="0" y="0" width="25.4" height="12.7" fill="#ff0000"/></svg>"##;

#[test]
fn rasterizes_at_requested_dpi() {
    let png = rasterize_to_png(SQUARE.as_bytes(), &usvg::Options::default(), 100.0).unwrap();
    let img = image::load_from_memory(&png).unwrap().to_rgba8();
    let (w, h) = img.dimensions();
    assert!((100..=101).contains(&w), "width {w}");
    assert!((50..=51).contains(&h), "height {h}");
    assert_eq!(img.get_pixel(w / 2, h / 2).0, [255, 0, 0, 255]);
}

#[test]
fn invalid_svg_is_an_error() {
    assert!(rasterize_to_png(b"not svg", &usvg::Options::default(), 96.0).is_err());
}

#[test]
fn unpremultiply_restores_straight_colour() {
    let mut px = vec![128u8, 0, 0, 128, 10, 20, 30, 0, 1, 2, 3, 255];
    unpremultiply_rgba8_in_place(&mut px);
    assert_eq!(px, vec![255, 0, 0, 128, 10, 20, 30, 0, 1, 2, 3, 255]);
}

#[test]
fn several_pages_without_split_are_refused_before_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tokens.png");
    let mut conv = SvgToPng::new(&RunConfig::new(&out));
    let pages = vec![
        Rendered::Text(SQUARE.to_string()),
        Rendered::Text(SQUARE.to_string()),
    ];
    let err = conv.convert(pages.clone(), &[], false, false).unwrap_err();
    assert!(matches!(err, TokenpressError::UnsupportedMultiPage(_)));

    let res = conv.convert(pages, &[], false, true).unwrap().unwrap();
    assert_eq!(res.len(), 2);
}
