//! Guillotine packing: free space is a list of disjoint sections, each placement cuts the section
//! it lands in into at most two new ones along the shorter axis.

use crate::foundation::core::{EPSILON, Rect, Size};
use crate::layout::bin::{Fitness, PageBin, Slot, less, orientations};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuillotineScore {
    /// Smallest leftover on the shorter side.
    BestShortSide,
    /// Smallest leftover area.
    BestArea,
    /// Smallest leftover on the longer side.
    BestLongSide,
}

impl GuillotineScore {
    fn fitness(self, section: Rect, size: Size) -> Fitness {
        let lw = section.width() - size.width;
        let lh = section.height() - size.height;
        match self {
            GuillotineScore::BestShortSide => (lw.min(lh), lw.max(lh)),
            GuillotineScore::BestArea => (section.area() - size.area(), lw.min(lh)),
            GuillotineScore::BestLongSide => (lw.max(lh), lw.min(lh)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GuillotineBin {
    rotation: bool,
    score: GuillotineScore,
    sections: Vec<Rect>,
}

struct Candidate {
    section: usize,
    size: Size,
    rotated: bool,
    fitness: Fitness,
}

impl GuillotineBin {
    pub fn new(size: Size, rotation: bool, score: GuillotineScore) -> Self {
        Self {
            rotation,
            score,
            sections: vec![size.to_rect()],
        }
    }

    pub fn sections(&self) -> &[Rect] {
        &self.sections
    }

    fn best(&self, size: Size) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;
        for (i, section) in self.sections.iter().enumerate() {
            for (dims, rotated) in orientations(size, self.rotation) {
                if !Size::new(section.width(), section.height()).fits(dims) {
                    continue;
                }
                let fitness = self.score.fitness(*section, dims);
                if best.as_ref().is_none_or(|b| less(fitness, b.fitness)) {
                    best = Some(Candidate {
                        section: i,
                        size: dims,
                        rotated,
                        fitness,
                    });
                }
            }
        }
        best
    }

    /// Shorter axis split.
    fn split(&mut self, section: Rect, size: Size) {
        let (w, h) = (size.width, size.height);
        if section.width() < section.height() {
            // Horizontal cut: the leftover below spans the whole section.
            self.add_section(Rect::new(section.x0, section.y0 + h, section.x1, section.y1));
            self.add_section(Rect::new(section.x0 + w, section.y0, section.x1, section.y0 + h));
        } else {
            // Vertical cut: the leftover to the right spans the whole section.
            self.add_section(Rect::new(section.x0, section.y0 + h, section.x0 + w, section.y1));
            self.add_section(Rect::new(section.x0 + w, section.y0, section.x1, section.y1));
        }
    }

    fn add_section(&mut self, mut section: Rect) {
        if section.width() <= EPSILON || section.height() <= EPSILON {
            return;
        }
        while let Some(i) = self.sections.iter().position(|s| joinable(*s, section)) {
            section = section.union(self.sections.remove(i));
        }
        self.sections.push(section);
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}

/// Two sections sharing a full edge.
fn joinable(a: Rect, b: Rect) -> bool {
    let stacked = close(a.x0, b.x0) && close(a.x1, b.x1) && (close(a.y1, b.y0) || close(b.y1, a.y0));
    let side_by_side =
        close(a.y0, b.y0) && close(a.y1, b.y1) && (close(a.x1, b.x0) || close(b.x1, a.x0));
    stacked || side_by_side
}

impl PageBin for GuillotineBin {
    fn fitness(&self, size: Size) -> Option<Fitness> {
        self.best(size).map(|c| c.fitness)
    }

    fn insert(&mut self, size: Size) -> Option<Slot> {
        let c = self.best(size)?;
        let section = self.sections.remove(c.section);
        self.split(section, c.size);
        Some(Slot {
            x: section.x0,
            y: section.y0,
            width: c.size.width,
            height: c.size.height,
            rotated: c.rotated,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/guillotine.rs"]
mod tests;
