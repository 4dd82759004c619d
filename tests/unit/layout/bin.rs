use pretty_assertions::assert_eq;

use super::*;

#[test]
fn pack_algo_names_parse_case_insensitively() {
    assert_eq!("maxrectsbssf".parse::<PackAlgo>().unwrap(), PackAlgo::MaxRectsBssf);
    assert_eq!(" SkylineMwf ".parse::<PackAlgo>().unwrap(), PackAlgo::SkylineMwf);
    for algo in PackAlgo::ALL {
        assert_eq!(algo.name().parse::<PackAlgo>().unwrap(), algo);
    }
    let err = "Tetris".parse::<PackAlgo>().unwrap_err();
    assert!(matches!(err, TokenpressError::Validation(ref m) if m.contains("GuillotineBssfSas")));
}

#[test]
fn square_or_fixed_tokens_have_one_orientation() {
    assert_eq!(orientations(Size::new(10.0, 10.0), true).count(), 1);
    assert_eq!(orientations(Size::new(10.0, 20.0), false).count(), 1);
    let both: Vec<_> = orientations(Size::new(10.0, 20.0), true).collect();
    assert_eq!(
        both,
        vec![(Size::new(10.0, 20.0), false), (Size::new(20.0, 10.0), true)]
    );
}

#[test]
fn fitness_compares_lexicographically() {
    assert!(less((1.0, 5.0), (2.0, 0.0)));
    assert!(less((1.0, 1.0), (1.0, 2.0)));
    assert!(!less((1.0, 1.0), (1.0, 1.0)));
    assert!(!less((3.0, 0.0), (2.0, 9.0)));
}

#[test]
fn every_heuristic_starts_in_the_corner() {
    for algo in PackAlgo::ALL {
        let mut bin = algo.new_bin(Size::new(100.0, 100.0), true);
        assert!(bin.fitness(Size::new(10.0, 10.0)).is_some(), "{algo}");
        let slot = bin.insert(Size::new(10.0, 10.0)).unwrap();
        assert_eq!((slot.x, slot.y, slot.rotated), (0.0, 0.0, false), "{algo}");
        assert!(bin.insert(Size::new(101.0, 1.0)).is_none(), "{algo}");
    }
}
