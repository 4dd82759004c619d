//! Best-of search: run several strategies and keep the cheapest result.

use rayon::prelude::*;

use crate::config::LayoutOptions;
use crate::foundation::core::Size;
use crate::foundation::error::{TokenpressError, TokenpressResult};
use crate::layout::bin::PackAlgo;
use crate::layout::rectpack::{BinAlgo, RectPackLayout, SortAlgo, compare, expand_choice};
use crate::layout::{Arrangement, Layout, PageSupply};

/// Runs every strategy on its own copy of the inputs and returns the result with the fewest
/// pages. Ties go to the smaller total page area, then to the earlier strategy.
pub struct BestOf {
    strategies: Vec<Box<dyn Layout>>,
    threads: Option<usize>,
}

impl BestOf {
    pub fn new(strategies: Vec<Box<dyn Layout>>) -> Self {
        Self {
            strategies,
            threads: None,
        }
    }

    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    /// The cross product of the configured options.
    ///
    /// Absent options search everything, except `pack_algo`, which falls back to the
    /// recommended heuristics, and `sort_algo`, which falls back to area.
    pub fn from_options(opts: &LayoutOptions) -> TokenpressResult<Self> {
        let bins = expand_choice(opts.bin_algo.as_ref(), &BinAlgo::ALL)?;
        let packs = match &opts.pack_algo {
            None => PackAlgo::RECOMMENDED.to_vec(),
            Some(choice) => expand_choice(Some(choice), &PackAlgo::ALL)?,
        };
        let sorts = match &opts.sort_algo {
            None => vec![SortAlgo::Area],
            Some(choice) => expand_choice(Some(choice), &SortAlgo::ALL)?,
        };
        let rotations = match opts.rotation {
            Some(r) => vec![r],
            None => vec![true, false],
        };

        let mut strategies: Vec<Box<dyn Layout>> = Vec::new();
        for &bin in &bins {
            for &pack in &packs {
                for &sort in &sorts {
                    for &rotation in &rotations {
                        strategies.push(Box::new(RectPackLayout::new(bin, pack, sort, rotation)));
                    }
                }
            }
        }
        Ok(Self::new(strategies).with_threads(opts.threads))
    }

    pub fn strategies(&self) -> &[Box<dyn Layout>] {
        &self.strategies
    }
}

impl Layout for BestOf {
    fn name(&self) -> String {
        format!("BestOf({} strategies)", self.strategies.len())
    }

    #[tracing::instrument(skip_all, fields(strategies = self.strategies.len(), tokens = tokens.len()))]
    fn arrange(
        &self,
        tokens: &[Size],
        pages: &PageSupply,
        verbose: bool,
    ) -> TokenpressResult<Arrangement> {
        if self.strategies.is_empty() {
            return Err(TokenpressError::validation("best-of search has no strategies"));
        }
        let pool = build_thread_pool(self.threads)?;
        let results: Vec<TokenpressResult<Arrangement>> = pool.install(|| {
            self.strategies
                .par_iter()
                .map(|s| s.arrange(tokens, pages, false))
                .collect()
        });

        let mut best: Option<(usize, Arrangement)> = None;
        let mut first_err = None;
        for (i, result) in results.into_iter().enumerate() {
            let name = self.strategies[i].name();
            match result {
                Ok(a) => {
                    if verbose {
                        tracing::info!(layout = %name, pages = a.page_count(), "candidate");
                    }
                    if best
                        .as_ref()
                        .is_none_or(|(_, b)| compare(&a, b).is_lt())
                    {
                        best = Some((i, a));
                    }
                }
                Err(e) => {
                    tracing::debug!(layout = %name, error = %e, "strategy failed");
                    first_err.get_or_insert(e);
                }
            }
        }

        match (best, first_err) {
            (Some((i, a)), _) => {
                tracing::info!(
                    layout = %self.strategies[i].name(),
                    pages = a.page_count(),
                    "best layout"
                );
                Ok(a)
            }
            (None, Some(e)) => Err(e),
            (None, None) => Err(TokenpressError::validation("best-of search produced nothing")),
        }
    }
}

fn build_thread_pool(threads: Option<usize>) -> TokenpressResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(TokenpressError::validation(
            "layout 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| TokenpressError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/layout/best.rs"]
mod tests;
