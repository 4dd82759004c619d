use pretty_assertions::assert_eq;

use super::*;

fn sizes(dims: &[(f64, f64)]) -> Vec<Size> {
    dims.iter().map(|&d| Size::from(d)).collect()
}

fn page() -> PageSupply {
    PageSupply::constant(Size::new(100.0, 100.0))
}

fn pages_of(a: &Arrangement) -> Vec<Vec<usize>> {
    a.pages
        .iter()
        .map(|p| p.placements.iter().map(|pl| pl.token).collect())
        .collect()
}

#[test]
fn sort_orders_are_descending_and_stable() {
    let tokens = sizes(&[(10.0, 10.0), (30.0, 30.0), (20.0, 20.0)]);
    assert_eq!(SortAlgo::Area.order(&tokens), vec![1, 2, 0]);
    assert_eq!(SortAlgo::None.order(&tokens), vec![0, 1, 2]);

    let tied = sizes(&[(10.0, 20.0), (20.0, 10.0)]);
    assert_eq!(SortAlgo::Area.order(&tied), vec![0, 1]);
    assert_eq!(SortAlgo::Ratio.order(&tied), vec![1, 0]);

    let sides = sizes(&[(10.0, 50.0), (20.0, 30.0)]);
    assert_eq!(SortAlgo::ShortSide.order(&sides), vec![1, 0]);
    assert_eq!(SortAlgo::LongSide.order(&sides), vec![0, 1]);
}

#[test]
fn option_names_parse_case_insensitively() {
    assert_eq!("bff".parse::<BinAlgo>().unwrap(), BinAlgo::FirstFit);
    assert_eq!("GLOBAL".parse::<BinAlgo>().unwrap(), BinAlgo::Global);
    assert_eq!("peri".parse::<SortAlgo>().unwrap(), SortAlgo::Perimeter);
    assert_eq!("SORT_AREA".parse::<SortAlgo>().unwrap(), SortAlgo::Area);
    assert!("BWF".parse::<BinAlgo>().is_err());
}

#[test]
fn name_lists_every_knob() {
    assert_eq!(
        RectPackLayout::default().name(),
        "RP(BFF, GuillotineBssfSas, AREA, 1)"
    );
    let l = RectPackLayout::new(BinAlgo::Global, PackAlgo::SkylineBl, SortAlgo::None, false);
    assert_eq!(l.name(), "RP(Global, SkylineBl, NONE, 0)");
}

#[test]
fn single_layout_options_take_one_value_each() {
    let mut opts = LayoutOptions::default();
    assert_eq!(RectPackLayout::from_options(&opts).unwrap(), RectPackLayout::default());

    opts.pack_algo = Some(Choice::One("maxrectsbaf".to_string()));
    opts.rotation = Some(false);
    let l = RectPackLayout::from_options(&opts).unwrap();
    assert_eq!((l.pack_algo, l.rotation), (PackAlgo::MaxRectsBaf, false));

    opts.bin_algo = Some(Choice::Many(vec!["BFF".into(), "BBF".into()]));
    assert!(matches!(
        RectPackLayout::from_options(&opts).unwrap_err(),
        TokenpressError::Validation(_)
    ));
    opts.bin_algo = Some(Choice::One("all".into()));
    assert!(RectPackLayout::from_options(&opts).is_err());
}

#[test]
fn first_fit_revisits_earlier_pages_and_next_fit_does_not() {
    let tokens = sizes(&[(60.0, 60.0), (60.0, 60.0), (30.0, 30.0)]);
    let ff = RectPackLayout::new(BinAlgo::FirstFit, PackAlgo::GuillotineBssfSas, SortAlgo::None, false);
    assert_eq!(pages_of(&ff.arrange(&tokens, &page(), false).unwrap()), vec![vec![0, 2], vec![1]]);

    let nf = RectPackLayout::new(BinAlgo::NextFit, PackAlgo::GuillotineBssfSas, SortAlgo::None, false);
    assert_eq!(pages_of(&nf.arrange(&tokens, &page(), false).unwrap()), vec![vec![0], vec![1, 2]]);
}

#[test]
fn global_fills_one_page_before_opening_the_next() {
    let tokens = sizes(&[(60.0, 60.0), (60.0, 60.0), (30.0, 30.0), (30.0, 30.0)]);
    let l = RectPackLayout::new(BinAlgo::Global, PackAlgo::MaxRectsBssf, SortAlgo::Area, false);
    let a = l.arrange(&tokens, &page(), false).unwrap();
    assert_eq!(a.page_count(), 2);
    assert_eq!(a.pages[0].placements.len(), 3);
    a.verify(tokens.len()).unwrap();
}

#[test]
fn rotation_rescues_tall_tokens() {
    let tall = sizes(&[(120.0, 50.0)]);
    let supply = PageSupply::constant(Size::new(100.0, 150.0));

    let fixed = RectPackLayout { rotation: false, ..RectPackLayout::default() };
    let err = fixed.arrange(&tall, &supply, false).unwrap_err();
    assert!(matches!(
        err,
        TokenpressError::TokenTooLarge { index: 0, page_width, .. } if page_width == 100.0
    ));

    let a = RectPackLayout::default().arrange(&tall, &supply, false).unwrap();
    let p = a.pages[0].placements[0];
    assert!(p.rotated);
    assert_eq!((p.width, p.height), (50.0, 120.0));
}

#[test]
fn oversized_tokens_fail_for_every_bin_policy() {
    let tokens = sizes(&[(10.0, 10.0), (110.0, 110.0)]);
    for bin in BinAlgo::ALL {
        let l = RectPackLayout { bin_algo: bin, ..RectPackLayout::default() };
        let err = l.arrange(&tokens, &page(), false).unwrap_err();
        assert!(
            matches!(err, TokenpressError::TokenTooLarge { index: 1, .. }),
            "{bin:?}: {err}"
        );
    }
}

#[test]
fn later_pages_come_from_the_supply_in_order() {
    let tokens = sizes(&[(60.0, 60.0), (60.0, 60.0)]);
    let supply = PageSupply::cycle(vec![Size::new(100.0, 100.0), Size::new(200.0, 200.0)]);
    let a = RectPackLayout::default().arrange(&tokens, &supply, false).unwrap();
    assert_eq!(a.pages[0].size, Size::new(100.0, 100.0));
    assert_eq!(a.pages[1].size, Size::new(200.0, 200.0));
}

#[test]
fn pages_too_small_for_a_token_are_skipped() {
    let tokens = sizes(&[(150.0, 150.0), (60.0, 60.0)]);
    let supply = PageSupply::cycle(vec![Size::new(100.0, 100.0), Size::new(200.0, 200.0)]);
    for bin in BinAlgo::ALL {
        let l = RectPackLayout { bin_algo: bin, ..RectPackLayout::default() };
        let a = l.arrange(&tokens, &supply, false).unwrap();
        a.verify(tokens.len()).unwrap();
        assert!(a.pages.iter().all(|p| !p.placements.is_empty()), "{bin:?}");
        let big = a
            .pages
            .iter()
            .find(|p| p.placements.iter().any(|pl| pl.token == 0))
            .unwrap();
        assert_eq!(big.size, Size::new(200.0, 200.0), "{bin:?}");
    }
}

#[test]
fn token_larger_than_every_supplied_page_is_too_large() {
    let tokens = sizes(&[(150.0, 150.0)]);
    let small = PageSupply::cycle(vec![Size::new(100.0, 100.0), Size::new(120.0, 80.0)]);
    let one_small = PageSupply::from_fn(|| std::iter::once(Size::new(100.0, 100.0)));
    for bin in BinAlgo::ALL {
        let l = RectPackLayout { bin_algo: bin, ..RectPackLayout::default() };
        for supply in [&small, &one_small] {
            let err = l.arrange(&tokens, supply, false).unwrap_err();
            assert!(
                matches!(err, TokenpressError::TokenTooLarge { index: 0, .. }),
                "{bin:?}: {err}"
            );
        }
    }
}

#[test]
fn exhausted_supply_is_a_validation_error() {
    let tokens = sizes(&[(90.0, 90.0), (90.0, 90.0)]);
    let one_page = PageSupply::from_fn(|| std::iter::once(Size::new(100.0, 100.0)));
    assert!(matches!(
        RectPackLayout::default().arrange(&tokens, &one_page, false).unwrap_err(),
        TokenpressError::Validation(_)
    ));
}

#[test]
fn empty_input_needs_no_pages() {
    let a = RectPackLayout::default().arrange(&[], &page(), false).unwrap();
    assert_eq!(a.page_count(), 0);
}
