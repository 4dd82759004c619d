//! MaxRects packing: free space is the set of maximal empty rectangles, which may overlap.

use crate::foundation::core::{EPSILON, Rect, Size};
use crate::layout::bin::{Fitness, PageBin, Slot, less, orientations};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaxRectsScore {
    BestShortSide,
    BestArea,
    /// Lowest top edge, then leftmost.
    BottomLeft,
}

impl MaxRectsScore {
    fn fitness(self, free: Rect, size: Size) -> Fitness {
        let lw = free.width() - size.width;
        let lh = free.height() - size.height;
        match self {
            MaxRectsScore::BestShortSide => (lw.min(lh), lw.max(lh)),
            MaxRectsScore::BestArea => (free.area() - size.area(), lw.min(lh)),
            MaxRectsScore::BottomLeft => (free.y0 + size.height, free.x0),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MaxRectsBin {
    rotation: bool,
    score: MaxRectsScore,
    free: Vec<Rect>,
}

impl MaxRectsBin {
    pub fn new(size: Size, rotation: bool, score: MaxRectsScore) -> Self {
        Self {
            rotation,
            score,
            free: vec![size.to_rect()],
        }
    }

    pub fn free_rects(&self) -> &[Rect] {
        &self.free
    }

    fn best(&self, size: Size) -> Option<(Rect, bool, Fitness)> {
        let mut best: Option<(Rect, bool, Fitness)> = None;
        for free in &self.free {
            for (dims, rotated) in orientations(size, self.rotation) {
                if !Size::new(free.width(), free.height()).fits(dims) {
                    continue;
                }
                let fitness = self.score.fitness(*free, dims);
                if best.is_none_or(|(_, _, b)| less(fitness, b)) {
                    let placed =
                        Rect::new(free.x0, free.y0, free.x0 + dims.width, free.y0 + dims.height);
                    best = Some((placed, rotated, fitness));
                }
            }
        }
        best
    }

    fn split_free(&mut self, placed: Rect) {
        let mut next = Vec::with_capacity(self.free.len() + 4);
        for f in self.free.drain(..) {
            if !overlaps(f, placed) {
                next.push(f);
                continue;
            }
            if placed.x0 > f.x0 + EPSILON {
                next.push(Rect::new(f.x0, f.y0, placed.x0, f.y1));
            }
            if placed.x1 < f.x1 - EPSILON {
                next.push(Rect::new(placed.x1, f.y0, f.x1, f.y1));
            }
            if placed.y0 > f.y0 + EPSILON {
                next.push(Rect::new(f.x0, f.y0, f.x1, placed.y0));
            }
            if placed.y1 < f.y1 - EPSILON {
                next.push(Rect::new(f.x0, placed.y1, f.x1, f.y1));
            }
        }
        self.free = prune(next);
    }
}

fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 - EPSILON && b.x0 < a.x1 - EPSILON && a.y0 < b.y1 - EPSILON && b.y0 < a.y1 - EPSILON
}

fn contains(outer: Rect, inner: Rect) -> bool {
    outer.x0 <= inner.x0 + EPSILON
        && outer.y0 <= inner.y0 + EPSILON
        && outer.x1 + EPSILON >= inner.x1
        && outer.y1 + EPSILON >= inner.y1
}

/// Drop rectangles contained in another one. Of two equal rectangles the first survives.
fn prune(rects: Vec<Rect>) -> Vec<Rect> {
    rects
        .iter()
        .enumerate()
        .filter(|&(i, r)| {
            !rects.iter().enumerate().any(|(j, o)| {
                i != j && contains(*o, *r) && (!contains(*r, *o) || j < i)
            })
        })
        .map(|(_, r)| *r)
        .collect()
}

impl PageBin for MaxRectsBin {
    fn fitness(&self, size: Size) -> Option<Fitness> {
        self.best(size).map(|(_, _, f)| f)
    }

    fn insert(&mut self, size: Size) -> Option<Slot> {
        let (placed, rotated, _) = self.best(size)?;
        self.split_free(placed);
        Some(Slot {
            x: placed.x0,
            y: placed.y0,
            width: placed.width(),
            height: placed.height(),
            rotated,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/maxrects.rs"]
mod tests;
