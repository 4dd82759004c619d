use pretty_assertions::assert_eq;

use super::*;
use crate::config::Choice;
use crate::layout::{PlacedPage, Placement};

/// Returns `pages` copies of `size`, tagged with `tag` so tests can tell results apart.
struct Fixed {
    tag: usize,
    pages: usize,
    size: Size,
}

impl Layout for Fixed {
    fn name(&self) -> String {
        format!("fixed{}", self.tag)
    }

    fn arrange(&self, _: &[Size], _: &PageSupply, _: bool) -> TokenpressResult<Arrangement> {
        let marker = Placement {
            token: self.tag,
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
            rotated: false,
        };
        Ok(Arrangement {
            pages: (0..self.pages)
                .map(|_| PlacedPage {
                    size: self.size,
                    placements: vec![marker],
                })
                .collect(),
        })
    }
}

struct Failing(&'static str);

impl Layout for Failing {
    fn name(&self) -> String {
        self.0.to_string()
    }

    fn arrange(&self, _: &[Size], _: &PageSupply, _: bool) -> TokenpressResult<Arrangement> {
        Err(TokenpressError::validation(self.0))
    }
}

fn fixed(tag: usize, pages: usize, side: f64) -> Box<dyn Layout> {
    Box::new(Fixed {
        tag,
        pages,
        size: Size::new(side, side),
    })
}

fn winner(best: &BestOf) -> TokenpressResult<usize> {
    let supply = PageSupply::constant(Size::new(100.0, 100.0));
    Ok(best.arrange(&[], &supply, false)?.pages[0].placements[0].token)
}

#[test]
fn fewest_pages_then_least_area_then_first() {
    let best = BestOf::new(vec![
        fixed(0, 3, 10.0),
        fixed(1, 2, 100.0),
        fixed(2, 2, 50.0),
        fixed(3, 2, 50.0),
    ]);
    assert_eq!(winner(&best).unwrap(), 2);
}

#[test]
fn failures_are_skipped_unless_everything_fails() {
    let best = BestOf::new(vec![Box::new(Failing("first")), fixed(7, 4, 10.0)]);
    assert_eq!(winner(&best).unwrap(), 7);

    let best = BestOf::new(vec![Box::new(Failing("first")), Box::new(Failing("second"))])
        .with_threads(Some(2));
    let err = winner(&best).unwrap_err();
    assert!(err.to_string().contains("first"), "{err}");
}

#[test]
fn zero_threads_is_rejected() {
    let best = BestOf::new(vec![fixed(0, 1, 10.0)]).with_threads(Some(0));
    assert!(matches!(
        winner(&best).unwrap_err(),
        TokenpressError::Validation(_)
    ));
    assert!(winner(&BestOf::new(Vec::new())).is_err());
}

#[test]
fn default_search_space() {
    let best = BestOf::from_options(&LayoutOptions::default()).unwrap();
    // 4 bin policies x 3 recommended heuristics x AREA x both rotations.
    assert_eq!(best.strategies().len(), 24);
    assert_eq!(best.name(), "BestOf(24 strategies)");
}

#[test]
fn constrained_search_space() {
    let opts = LayoutOptions {
        bin_algo: Some(Choice::One("BFF".into())),
        pack_algo: Some(Choice::One("all".into())),
        sort_algo: Some(Choice::Many(vec!["AREA".into(), "PERI".into()])),
        rotation: Some(true),
        ..LayoutOptions::default()
    };
    let best = BestOf::from_options(&opts).unwrap();
    assert_eq!(best.strategies().len(), 8 * 2);
    assert_eq!(
        best.strategies()[0].name(),
        "RP(BFF, GuillotineBssfSas, AREA, 1)"
    );

    let bad = LayoutOptions {
        sort_algo: Some(Choice::Many(Vec::new())),
        ..LayoutOptions::default()
    };
    assert!(BestOf::from_options(&bad).is_err());
}

#[test]
fn never_worse_than_any_member() {
    let tokens: Vec<Size> = [(70.0, 20.0), (30.0, 80.0), (45.0, 45.0), (20.0, 20.0), (55.0, 35.0)]
        .iter()
        .cycle()
        .take(15)
        .map(|&d| Size::from(d))
        .collect();
    let supply = PageSupply::constant(Size::new(100.0, 100.0));
    let best = BestOf::from_options(&LayoutOptions::default()).unwrap();
    let chosen = best.arrange(&tokens, &supply, false).unwrap();
    chosen.verify(tokens.len()).unwrap();
    for s in best.strategies() {
        let a = s.arrange(&tokens, &supply, false).unwrap();
        assert!(chosen.page_count() <= a.page_count(), "{}", s.name());
    }
}
