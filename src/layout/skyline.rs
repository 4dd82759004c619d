//! Skyline packing: the filled region is tracked as a sequence of horizontal segments and each
//! rectangle rests on top of the segments it spans.

use crate::foundation::core::{EPSILON, Size};
use crate::layout::bin::{Fitness, PageBin, Slot, less, orientations};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkylineScore {
    /// Lowest top edge, then leftmost.
    BottomLeft,
    /// Least area trapped below the rectangle, then lowest top edge.
    MinWaste,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub x: f64,
    pub y: f64,
    pub width: f64,
}

impl Segment {
    fn right(&self) -> f64 {
        self.x + self.width
    }
}

#[derive(Clone, Debug)]
pub struct SkylineBin {
    size: Size,
    rotation: bool,
    score: SkylineScore,
    skyline: Vec<Segment>,
}

struct Candidate {
    x: f64,
    y: f64,
    size: Size,
    rotated: bool,
    fitness: Fitness,
}

impl SkylineBin {
    pub fn new(size: Size, rotation: bool, score: SkylineScore) -> Self {
        Self {
            size,
            rotation,
            score,
            skyline: vec![Segment {
                x: 0.0,
                y: 0.0,
                width: size.width,
            }],
        }
    }

    pub fn skyline(&self) -> &[Segment] {
        &self.skyline
    }

    /// Resting height and trapped area for a `size` rectangle whose left edge is segment `i`.
    fn rest_on(&self, i: usize, size: Size) -> Option<(f64, f64)> {
        let x = self.skyline[i].x;
        let right = x + size.width;
        if right > self.size.width + EPSILON {
            return None;
        }
        let spanned = self.skyline[i..]
            .iter()
            .take_while(|s| s.x < right - EPSILON);
        let y = spanned.clone().fold(0.0_f64, |y, s| y.max(s.y));
        if y + size.height > self.size.height + EPSILON {
            return None;
        }
        let waste = spanned
            .map(|s| (y - s.y) * (s.right().min(right) - s.x.max(x)))
            .sum();
        Some((y, waste))
    }

    fn best(&self, size: Size) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;
        for i in 0..self.skyline.len() {
            for (dims, rotated) in orientations(size, self.rotation) {
                let Some((y, waste)) = self.rest_on(i, dims) else {
                    continue;
                };
                let x = self.skyline[i].x;
                let fitness = match self.score {
                    SkylineScore::BottomLeft => (y + dims.height, x),
                    SkylineScore::MinWaste => (waste, y + dims.height),
                };
                if best.as_ref().is_none_or(|b| less(fitness, b.fitness)) {
                    best = Some(Candidate {
                        x,
                        y,
                        size: dims,
                        rotated,
                        fitness,
                    });
                }
            }
        }
        best
    }

    fn raise(&mut self, x: f64, top: f64, width: f64) {
        let right = x + width;
        let mut next = Vec::with_capacity(self.skyline.len() + 2);
        for s in &self.skyline {
            if s.right() <= x + EPSILON || s.x >= right - EPSILON {
                next.push(*s);
                continue;
            }
            if s.x < x - EPSILON {
                next.push(Segment {
                    x: s.x,
                    y: s.y,
                    width: x - s.x,
                });
            }
            if s.right() > right + EPSILON {
                next.push(Segment {
                    x: right,
                    y: s.y,
                    width: s.right() - right,
                });
            }
        }
        next.push(Segment { x, y: top, width });
        next.sort_by(|a, b| a.x.total_cmp(&b.x));

        let mut merged: Vec<Segment> = Vec::with_capacity(next.len());
        for s in next {
            match merged.last_mut() {
                Some(last) if (last.y - s.y).abs() <= EPSILON => last.width += s.width,
                _ => merged.push(s),
            }
        }
        self.skyline = merged;
    }
}

impl PageBin for SkylineBin {
    fn fitness(&self, size: Size) -> Option<Fitness> {
        self.best(size).map(|c| c.fitness)
    }

    fn insert(&mut self, size: Size) -> Option<Slot> {
        let c = self.best(size)?;
        self.raise(c.x, c.y + c.size.height, c.size.width);
        Some(Slot {
            x: c.x,
            y: c.y,
            width: c.size.width,
            height: c.size.height,
            rotated: c.rotated,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/skyline.rs"]
mod tests;
