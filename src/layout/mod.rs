//! Token arrangement: packing footprints onto as few pages as possible.
//!
//! A [`Layout`] turns a list of token sizes and a lazy [`PageSupply`] into an [`Arrangement`]:
//! one placement list per page. Concrete strategies live in [`rectpack`]; [`best`] runs several
//! of them and keeps the winner; [`margins`] adds per-token spacing around any strategy.

pub mod best;
pub mod bin;
pub mod guillotine;
pub mod margins;
pub mod maxrects;
pub mod rectpack;
pub mod skyline;

use std::sync::Arc;

use crate::config::{LayoutKind, LayoutOptions};
use crate::foundation::core::{EPSILON, Margins, Rect, Size};
use crate::foundation::error::{TokenpressError, TokenpressResult};

pub use best::BestOf;
pub use bin::PackAlgo;
pub use margins::MarginLayout;
pub use rectpack::{BinAlgo, RectPackLayout, SortAlgo};

/// One token on one page. Coordinates are millimetres from the page's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Index into the token list passed to [`Layout::arrange`].
    pub token: usize,
    pub x: f64,
    pub y: f64,
    /// Width as placed, i.e. the token height when `rotated`.
    pub width: f64,
    pub height: f64,
    /// Turned a quarter clockwise.
    pub rotated: bool,
}

impl Placement {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedPage {
    pub size: Size,
    pub placements: Vec<Placement>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arrangement {
    pub pages: Vec<PlacedPage>,
}

impl Arrangement {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn total_area(&self) -> f64 {
        self.pages.iter().map(|p| p.size.area()).sum()
    }

    pub fn placement_count(&self) -> usize {
        self.pages.iter().map(|p| p.placements.len()).sum()
    }

    /// Check that `tokens` tokens were each placed exactly once, inside their page, without
    /// overlapping another placement on the same page.
    pub fn verify(&self, tokens: usize) -> TokenpressResult<()> {
        let mut seen = vec![false; tokens];
        for (page_index, page) in self.pages.iter().enumerate() {
            let bounds = page.size.to_rect();
            for (i, p) in page.placements.iter().enumerate() {
                let Some(slot) = seen.get_mut(p.token) else {
                    return Err(TokenpressError::validation(format!(
                        "page {page_index} places unknown token {}",
                        p.token
                    )));
                };
                if std::mem::replace(slot, true) {
                    return Err(TokenpressError::validation(format!(
                        "token {} placed more than once",
                        p.token
                    )));
                }
                let r = p.rect();
                if r.x0 < bounds.x0 - EPSILON
                    || r.y0 < bounds.y0 - EPSILON
                    || r.x1 > bounds.x1 + EPSILON
                    || r.y1 > bounds.y1 + EPSILON
                {
                    return Err(TokenpressError::validation(format!(
                        "token {} at {r:?} leaves page {page_index}",
                        p.token
                    )));
                }
                if let Some(other) = page.placements[..i]
                    .iter()
                    .find(|o| overlap_area(o.rect(), r) > EPSILON)
                {
                    return Err(TokenpressError::validation(format!(
                        "tokens {} and {} overlap on page {page_index}",
                        other.token, p.token
                    )));
                }
            }
        }
        if let Some(missing) = seen.iter().position(|s| !s) {
            return Err(TokenpressError::validation(format!(
                "token {missing} was not placed"
            )));
        }
        Ok(())
    }

    /// Map placements made inside a printable area back to full pages.
    pub fn inset_pages(mut self, margins: Margins) -> Self {
        for page in &mut self.pages {
            page.size = page.size.grow(margins);
            for p in &mut page.placements {
                p.x += margins.left;
                p.y += margins.top;
            }
        }
        self
    }
}

fn overlap_area(a: Rect, b: Rect) -> f64 {
    let w = a.x1.min(b.x1) - a.x0.max(b.x0);
    let h = a.y1.min(b.y1) - a.y0.max(b.y0);
    if w > 0.0 && h > 0.0 { w * h } else { 0.0 }
}

type SupplyFn = dyn Fn() -> Box<dyn Iterator<Item = Size> + Send> + Send + Sync;

/// A restartable, lazily produced sequence of page sizes.
///
/// Every call to [`PageSupply::iter`] starts over, so concurrent strategy runs each see the
/// whole sequence.
#[derive(Clone)]
pub struct PageSupply {
    make: Arc<SupplyFn>,
}

impl std::fmt::Debug for PageSupply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let head: Vec<Size> = self.iter().take(3).collect();
        f.debug_struct("PageSupply").field("head", &head).finish()
    }
}

impl PageSupply {
    pub fn from_fn<F, I>(make: F) -> Self
    where
        F: Fn() -> I + Send + Sync + 'static,
        I: Iterator<Item = Size> + Send + 'static,
    {
        Self {
            make: Arc::new(move || Box::new(make()) as Box<dyn Iterator<Item = Size> + Send>),
        }
    }

    /// The same size forever.
    pub fn constant(size: Size) -> Self {
        Self::from_fn(move || std::iter::repeat(size))
    }

    /// `sizes` repeated in order forever. An empty list yields nothing.
    pub fn cycle(sizes: Vec<Size>) -> Self {
        let sizes: Arc<[Size]> = sizes.into();
        Self::from_fn(move || {
            let sizes = Arc::clone(&sizes);
            (0..).map_while(move |i| sizes.get(i % sizes.len().max(1)).copied())
        })
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = Size> + Send> {
        (self.make)()
    }

    /// Every size reduced by `margins`.
    pub fn shrink(&self, margins: Margins) -> Self {
        let inner = self.clone();
        Self::from_fn(move || inner.iter().map(move |s| s.shrink(margins)))
    }
}

/// A token arrangement strategy.
pub trait Layout: Send + Sync {
    /// Short description used in logs.
    fn name(&self) -> String;

    /// Place every token in `tokens` on pages drawn from `pages`, in order.
    fn arrange(
        &self,
        tokens: &[Size],
        pages: &PageSupply,
        verbose: bool,
    ) -> TokenpressResult<Arrangement>;
}

impl std::fmt::Debug for dyn Layout + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

/// Build the layout described by `opts`.
pub fn make_layout(opts: &LayoutOptions) -> TokenpressResult<Box<dyn Layout>> {
    match opts.layout {
        LayoutKind::Single => Ok(Box::new(RectPackLayout::from_options(opts)?)),
        LayoutKind::Best => Ok(Box::new(BestOf::from_options(opts)?)),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/mod.rs"]
mod tests;
