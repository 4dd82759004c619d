//! Offline rectangle packing over an unbounded page supply.
//!
//! A [`RectPackLayout`] is a bin-selection policy ([`BinAlgo`]), an in-page heuristic
//! ([`PackAlgo`]), a sort order ([`SortAlgo`]) and a rotation switch. Pages are drawn from the
//! supply only when the open ones cannot take the next token.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::config::{Choice, LayoutOptions};
use crate::foundation::core::Size;
use crate::foundation::error::{TokenpressError, TokenpressResult};
use crate::layout::bin::{PackAlgo, PageBin, Slot, less, parse_named};
use crate::layout::{Arrangement, Layout, PageSupply, PlacedPage, Placement};

/// How the page for the next token is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinAlgo {
    /// Only the most recently opened page is tried.
    NextFit,
    /// Open pages are tried in opening order.
    FirstFit,
    /// The open page with the best fitness wins.
    BestFit,
    /// Fill one page at a time, always picking the remaining token that fits it best.
    Global,
}

impl BinAlgo {
    pub const ALL: [BinAlgo; 4] = [
        BinAlgo::NextFit,
        BinAlgo::FirstFit,
        BinAlgo::BestFit,
        BinAlgo::Global,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BinAlgo::NextFit => "BNF",
            BinAlgo::FirstFit => "BFF",
            BinAlgo::BestFit => "BBF",
            BinAlgo::Global => "Global",
        }
    }
}

impl FromStr for BinAlgo {
    type Err = TokenpressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named(s, &Self::ALL, |a| a.name(), "bin_algo")
    }
}

/// Order in which tokens are fed to the packer. Every order except `None` is descending.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SortAlgo {
    None,
    Area,
    Perimeter,
    /// Difference between the sides.
    Difference,
    /// Shorter side, then longer side.
    ShortSide,
    /// Longer side, then shorter side.
    LongSide,
    /// Width over height.
    Ratio,
}

impl SortAlgo {
    pub const ALL: [SortAlgo; 7] = [
        SortAlgo::None,
        SortAlgo::Area,
        SortAlgo::Perimeter,
        SortAlgo::Difference,
        SortAlgo::ShortSide,
        SortAlgo::LongSide,
        SortAlgo::Ratio,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SortAlgo::None => "NONE",
            SortAlgo::Area => "AREA",
            SortAlgo::Perimeter => "PERI",
            SortAlgo::Difference => "DIFF",
            SortAlgo::ShortSide => "SSIDE",
            SortAlgo::LongSide => "LSIDE",
            SortAlgo::Ratio => "RATIO",
        }
    }

    fn key(self, s: Size) -> (f64, f64) {
        let (short, long) = (s.width.min(s.height), s.width.max(s.height));
        match self {
            SortAlgo::None => (0.0, 0.0),
            SortAlgo::Area => (s.area(), 0.0),
            SortAlgo::Perimeter => (s.width + s.height, 0.0),
            SortAlgo::Difference => ((s.width - s.height).abs(), 0.0),
            SortAlgo::ShortSide => (short, long),
            SortAlgo::LongSide => (long, short),
            SortAlgo::Ratio => (s.width / s.height, 0.0),
        }
    }

    /// Token indices in packing order. Equal keys keep their input order.
    pub fn order(self, tokens: &[Size]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..tokens.len()).collect();
        if self != SortAlgo::None {
            order.sort_by(|&a, &b| {
                let (ka, kb) = (self.key(tokens[a]), self.key(tokens[b]));
                kb.0.total_cmp(&ka.0).then(kb.1.total_cmp(&ka.1))
            });
        }
        order
    }
}

impl FromStr for SortAlgo {
    type Err = TokenpressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s
            .get(..5)
            .filter(|p| p.eq_ignore_ascii_case("SORT_"))
            .map_or(s, |_| &s[5..]);
        parse_named(s, &Self::ALL, |a| a.name(), "sort_algo")
    }
}

/// Parse an optional [`Choice`] into concrete values. `None` and `"all"` yield `fallback`.
pub(crate) fn expand_choice<T>(choice: Option<&Choice>, fallback: &[T]) -> TokenpressResult<Vec<T>>
where
    T: FromStr<Err = TokenpressError> + Copy,
{
    match choice.and_then(Choice::names) {
        None => Ok(fallback.to_vec()),
        Some(names) if names.is_empty() => Err(TokenpressError::validation(
            "option lists must not be empty",
        )),
        Some(names) => names.iter().map(|n| n.parse()).collect(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RectPackLayout {
    pub bin_algo: BinAlgo,
    pub pack_algo: PackAlgo,
    pub sort_algo: SortAlgo,
    pub rotation: bool,
}

impl Default for RectPackLayout {
    fn default() -> Self {
        Self {
            bin_algo: BinAlgo::FirstFit,
            pack_algo: PackAlgo::GuillotineBssfSas,
            sort_algo: SortAlgo::Area,
            rotation: true,
        }
    }
}

/// Fresh pages that may reject a token in a row before it counts as too large for the supply.
pub const PAGE_LOOKAHEAD: usize = 16;

struct OpenPage {
    size: Size,
    bin: Box<dyn PageBin>,
    placements: Vec<Placement>,
}

impl OpenPage {
    fn place(&mut self, token: usize, slot: Slot) {
        self.placements.push(Placement {
            token,
            x: slot.x,
            y: slot.y,
            width: slot.width,
            height: slot.height,
            rotated: slot.rotated,
        });
    }
}

impl RectPackLayout {
    pub fn new(bin_algo: BinAlgo, pack_algo: PackAlgo, sort_algo: SortAlgo, rotation: bool) -> Self {
        Self {
            bin_algo,
            pack_algo,
            sort_algo,
            rotation,
        }
    }

    /// A single strategy from `opts`. Each option may name at most one value.
    pub fn from_options(opts: &LayoutOptions) -> TokenpressResult<Self> {
        let d = Self::default();
        Ok(Self {
            bin_algo: single("bin_algo", opts.bin_algo.as_ref(), d.bin_algo)?,
            pack_algo: single("pack_algo", opts.pack_algo.as_ref(), d.pack_algo)?,
            sort_algo: single("sort_algo", opts.sort_algo.as_ref(), d.sort_algo)?,
            rotation: opts.rotation.unwrap_or(d.rotation),
        })
    }

    fn new_page(&self, size: Size) -> OpenPage {
        OpenPage {
            size,
            bin: self.pack_algo.new_bin(size, self.rotation),
            placements: Vec::new(),
        }
    }

    /// Put `token` on a fresh page. Pages that reject it are skipped, up to
    /// [`PAGE_LOOKAHEAD`] of them.
    fn open_with(
        &self,
        open: &mut Vec<OpenPage>,
        pages: &mut dyn Iterator<Item = Size>,
        token: usize,
        size: Size,
    ) -> TokenpressResult<()> {
        let mut rejected = None;
        for page_size in pages.take(PAGE_LOOKAHEAD) {
            let mut page = self.new_page(page_size);
            if let Some(slot) = page.bin.insert(size) {
                page.place(token, slot);
                open.push(page);
                return Ok(());
            }
            tracing::debug!(token, ?page_size, "fresh page rejects token, skipping it");
            rejected = Some(page_size);
        }
        Err(match rejected {
            Some(page_size) => too_large(token, size, page_size),
            None => supply_ran_out(),
        })
    }

    fn pack_online(
        &self,
        tokens: &[Size],
        order: &[usize],
        pages: &mut dyn Iterator<Item = Size>,
    ) -> TokenpressResult<Vec<OpenPage>> {
        let mut open: Vec<OpenPage> = Vec::new();
        for &token in order {
            let size = tokens[token];
            let target = match self.bin_algo {
                BinAlgo::NextFit => open
                    .len()
                    .checked_sub(1)
                    .filter(|&i| open[i].bin.fitness(size).is_some()),
                BinAlgo::FirstFit | BinAlgo::Global => {
                    open.iter().position(|p| p.bin.fitness(size).is_some())
                }
                BinAlgo::BestFit => {
                    let mut best: Option<(usize, (f64, f64))> = None;
                    for (i, p) in open.iter().enumerate() {
                        if let Some(f) = p.bin.fitness(size)
                            && best.is_none_or(|(_, b)| less(f, b))
                        {
                            best = Some((i, f));
                        }
                    }
                    best.map(|(i, _)| i)
                }
            };
            match target.and_then(|i| open[i].bin.insert(size).map(|slot| (i, slot))) {
                Some((i, slot)) => open[i].place(token, slot),
                None => self.open_with(&mut open, pages, token, size)?,
            }
        }
        Ok(open)
    }

    fn pack_global(
        &self,
        tokens: &[Size],
        order: &[usize],
        pages: &mut dyn Iterator<Item = Size>,
    ) -> TokenpressResult<Vec<OpenPage>> {
        let mut remaining = order.to_vec();
        let mut done = Vec::new();
        let mut skipped = 0;
        let mut rejected: Option<Size> = None;
        while let Some(&first) = remaining.first() {
            let too_big = |page_size: Size| too_large(first, tokens[first], page_size);
            let Some(page_size) = pages.next() else {
                return Err(rejected.map_or_else(supply_ran_out, too_big));
            };
            let mut page = self.new_page(page_size);
            loop {
                let mut best: Option<(usize, (f64, f64))> = None;
                for (pos, &token) in remaining.iter().enumerate() {
                    if let Some(f) = page.bin.fitness(tokens[token])
                        && best.is_none_or(|(_, b)| less(f, b))
                    {
                        best = Some((pos, f));
                    }
                }
                let Some((pos, _)) = best else { break };
                let token = remaining[pos];
                let Some(slot) = page.bin.insert(tokens[token]) else {
                    break;
                };
                page.place(token, slot);
                remaining.remove(pos);
            }
            if page.placements.is_empty() {
                tracing::debug!(?page_size, "no remaining token fits the page, skipping it");
                skipped += 1;
                if skipped >= PAGE_LOOKAHEAD {
                    return Err(too_big(page_size));
                }
                rejected = Some(page_size);
                continue;
            }
            skipped = 0;
            rejected = None;
            done.push(page);
        }
        Ok(done)
    }
}

fn single<T>(what: &str, choice: Option<&Choice>, default: T) -> TokenpressResult<T>
where
    T: FromStr<Err = TokenpressError> + Copy,
{
    match choice.map(Choice::names) {
        None => Ok(default),
        Some(Some(names)) if names.len() == 1 => names[0].parse(),
        Some(_) => Err(TokenpressError::validation(format!(
            "layout 'single' takes exactly one {what}; use layout 'best' to search several"
        ))),
    }
}

fn supply_ran_out() -> TokenpressError {
    TokenpressError::validation("page supply ran out")
}

fn too_large(index: usize, size: Size, page: Size) -> TokenpressError {
    TokenpressError::TokenTooLarge {
        index,
        width: size.width,
        height: size.height,
        page_width: page.width,
        page_height: page.height,
    }
}

impl Layout for RectPackLayout {
    fn name(&self) -> String {
        format!(
            "RP({}, {}, {}, {})",
            self.bin_algo.name(),
            self.pack_algo,
            self.sort_algo.name(),
            u8::from(self.rotation)
        )
    }

    fn arrange(
        &self,
        tokens: &[Size],
        pages: &PageSupply,
        verbose: bool,
    ) -> TokenpressResult<Arrangement> {
        let order = self.sort_algo.order(tokens);
        let mut supply = pages.iter();
        let open = match self.bin_algo {
            BinAlgo::Global => self.pack_global(tokens, &order, &mut supply)?,
            _ => self.pack_online(tokens, &order, &mut supply)?,
        };
        let arrangement = Arrangement {
            pages: open
                .into_iter()
                .map(|p| PlacedPage {
                    size: p.size,
                    placements: p.placements,
                })
                .collect(),
        };
        if verbose {
            tracing::info!(layout = %self.name(), pages = arrangement.page_count(), "packed");
        } else {
            tracing::debug!(layout = %self.name(), pages = arrangement.page_count(), "packed");
        }
        Ok(arrangement)
    }
}

/// Compare two results: fewer pages first, then less total page area.
pub(crate) fn compare(a: &Arrangement, b: &Arrangement) -> Ordering {
    a.page_count()
        .cmp(&b.page_count())
        .then(a.total_area().total_cmp(&b.total_area()))
}

#[cfg(test)]
#[path = "../../tests/unit/layout/rectpack.rs"]
mod tests;
