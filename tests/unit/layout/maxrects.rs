use pretty_assertions::assert_eq;

use super::*;

fn bin(score: MaxRectsScore) -> MaxRectsBin {
    MaxRectsBin::new(Size::new(100.0, 100.0), false, score)
}

#[test]
fn free_space_stays_maximal() {
    let mut b = bin(MaxRectsScore::BestShortSide);
    b.insert(Size::new(40.0, 40.0)).unwrap();
    let mut free = b.free_rects().to_vec();
    free.sort_by(|a, b| a.x0.total_cmp(&b.x0));
    assert_eq!(
        free,
        vec![
            Rect::new(0.0, 40.0, 100.0, 100.0),
            Rect::new(40.0, 0.0, 100.0, 100.0)
        ]
    );
}

#[test]
fn four_quarters_fill_the_page() {
    let mut b = bin(MaxRectsScore::BestShortSide);
    for _ in 0..4 {
        b.insert(Size::new(50.0, 50.0)).unwrap();
    }
    assert!(b.free_rects().is_empty());
    assert!(b.fitness(Size::new(1.0, 1.0)).is_none());
}

#[test]
fn prune_drops_contained_and_duplicate_rects() {
    let outer = Rect::new(0.0, 0.0, 10.0, 10.0);
    let pruned = prune(vec![outer, Rect::new(2.0, 2.0, 5.0, 5.0), outer]);
    assert_eq!(pruned, vec![outer]);
}

#[test]
fn bottom_left_prefers_low_positions() {
    let mut b = bin(MaxRectsScore::BottomLeft);
    b.insert(Size::new(60.0, 20.0)).unwrap();
    let slot = b.insert(Size::new(40.0, 10.0)).unwrap();
    assert_eq!((slot.x, slot.y), (60.0, 0.0));
}

#[test]
fn overlap_ignores_shared_edges() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert!(!overlaps(a, Rect::new(10.0, 0.0, 20.0, 10.0)));
    assert!(overlaps(a, Rect::new(9.0, 9.0, 20.0, 20.0)));
}
