//! The in-page packing heuristics and the shared contract they implement.

use std::str::FromStr;

use crate::foundation::core::{EPSILON, Size};
use crate::foundation::error::{TokenpressError, TokenpressResult};
use crate::layout::guillotine::{GuillotineBin, GuillotineScore};
use crate::layout::maxrects::{MaxRectsBin, MaxRectsScore};
use crate::layout::skyline::{SkylineBin, SkylineScore};

/// Placement score, compared lexicographically. Lower is better.
pub type Fitness = (f64, f64);

/// Where a rectangle landed inside a bin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Slot {
    pub x: f64,
    pub y: f64,
    /// Occupied width, after rotation.
    pub width: f64,
    /// Occupied height, after rotation.
    pub height: f64,
    pub rotated: bool,
}

/// One page being filled by an in-page heuristic.
pub trait PageBin: Send {
    /// Score of the best position for `size`, or `None` when it does not fit.
    fn fitness(&self, size: Size) -> Option<Fitness>;

    /// Place `size` at its best position.
    fn insert(&mut self, size: Size) -> Option<Slot>;
}

/// In-page heuristic: the rectangle family plus its scoring rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PackAlgo {
    GuillotineBssfSas,
    GuillotineBafSas,
    GuillotineBlsfSas,
    MaxRectsBssf,
    MaxRectsBaf,
    MaxRectsBl,
    SkylineBl,
    SkylineMwf,
}

impl PackAlgo {
    pub const ALL: [PackAlgo; 8] = [
        PackAlgo::GuillotineBssfSas,
        PackAlgo::GuillotineBafSas,
        PackAlgo::GuillotineBlsfSas,
        PackAlgo::MaxRectsBssf,
        PackAlgo::MaxRectsBaf,
        PackAlgo::MaxRectsBl,
        PackAlgo::SkylineBl,
        PackAlgo::SkylineMwf,
    ];

    /// The heuristics searched when none are configured.
    pub const RECOMMENDED: [PackAlgo; 3] = [
        PackAlgo::GuillotineBssfSas,
        PackAlgo::MaxRectsBssf,
        PackAlgo::SkylineMwf,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PackAlgo::GuillotineBssfSas => "GuillotineBssfSas",
            PackAlgo::GuillotineBafSas => "GuillotineBafSas",
            PackAlgo::GuillotineBlsfSas => "GuillotineBlsfSas",
            PackAlgo::MaxRectsBssf => "MaxRectsBssf",
            PackAlgo::MaxRectsBaf => "MaxRectsBaf",
            PackAlgo::MaxRectsBl => "MaxRectsBl",
            PackAlgo::SkylineBl => "SkylineBl",
            PackAlgo::SkylineMwf => "SkylineMwf",
        }
    }

    /// An empty bin of `size` using this heuristic.
    pub fn new_bin(self, size: Size, rotation: bool) -> Box<dyn PageBin> {
        match self {
            PackAlgo::GuillotineBssfSas => {
                Box::new(GuillotineBin::new(size, rotation, GuillotineScore::BestShortSide))
            }
            PackAlgo::GuillotineBafSas => {
                Box::new(GuillotineBin::new(size, rotation, GuillotineScore::BestArea))
            }
            PackAlgo::GuillotineBlsfSas => {
                Box::new(GuillotineBin::new(size, rotation, GuillotineScore::BestLongSide))
            }
            PackAlgo::MaxRectsBssf => {
                Box::new(MaxRectsBin::new(size, rotation, MaxRectsScore::BestShortSide))
            }
            PackAlgo::MaxRectsBaf => {
                Box::new(MaxRectsBin::new(size, rotation, MaxRectsScore::BestArea))
            }
            PackAlgo::MaxRectsBl => {
                Box::new(MaxRectsBin::new(size, rotation, MaxRectsScore::BottomLeft))
            }
            PackAlgo::SkylineBl => {
                Box::new(SkylineBin::new(size, rotation, SkylineScore::BottomLeft))
            }
            PackAlgo::SkylineMwf => {
                Box::new(SkylineBin::new(size, rotation, SkylineScore::MinWaste))
            }
        }
    }
}

impl FromStr for PackAlgo {
    type Err = TokenpressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named(s, &Self::ALL, |a| a.name(), "pack_algo")
    }
}

impl std::fmt::Display for PackAlgo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Case-insensitive lookup of `s` among `values` by their display names.
pub(crate) fn parse_named<T: Copy>(
    s: &str,
    values: &[T],
    name: impl Fn(T) -> &'static str,
    what: &str,
) -> TokenpressResult<T> {
    values
        .iter()
        .copied()
        .find(|v| name(*v).eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| {
            let known = values.iter().map(|v| name(*v)).collect::<Vec<_>>().join(", ");
            TokenpressError::validation(format!("unknown {what} '{s}' (known: {known})"))
        })
}

/// Orientations worth trying for `size`: as is, then turned when allowed and not square.
pub(crate) fn orientations(size: Size, rotation: bool) -> impl Iterator<Item = (Size, bool)> {
    let turn = rotation && (size.width - size.height).abs() > EPSILON;
    std::iter::once((size, false)).chain(turn.then_some((size.rotated(), true)))
}

pub(crate) fn less(a: Fitness, b: Fitness) -> bool {
    a.0 < b.0 - EPSILON || ((a.0 - b.0).abs() <= EPSILON && a.1 < b.1 - EPSILON)
}

#[cfg(test)]
#[path = "../../tests/unit/layout/bin.rs"]
mod tests;
