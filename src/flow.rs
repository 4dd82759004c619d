//! One end-to-end run: compose the canvas chain, arrange the tokens, draw them and save.

use std::path::PathBuf;

use crate::canvas::{CanvasNode, make_canvas};
use crate::config::RunConfig;
use crate::foundation::core::{Margins, Size};
use crate::foundation::error::{TokenpressError, TokenpressResult};
use crate::layout::{Arrangement, MarginLayout, PageSupply, make_layout};
use crate::token::{Token, cards_from_specs};

/// What a run produced.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    /// Requested output path. Per-page formats with `split_pages` write numbered siblings.
    pub output: PathBuf,
    /// Resolved name of the outermost canvas node.
    pub canvas: String,
    pub layout: String,
    pub pages: usize,
    pub tokens: usize,
}

/// Run with the cards listed in `cfg.tokens`.
pub fn run(cfg: &mut RunConfig) -> TokenpressResult<RunSummary> {
    cfg.validate()?;
    let tokens = cards_from_specs(&cfg.tokens);
    run_with_tokens(cfg, &tokens)
}

/// Run with caller-supplied tokens.
///
/// The canvas chain is composed first so format problems surface before any layout work.
/// Canvas cleanup runs whether or not drawing and saving succeed.
#[tracing::instrument(skip_all, fields(output = %cfg.output_file.display(), tokens = tokens.len()))]
pub fn run_with_tokens(
    cfg: &mut RunConfig,
    tokens: &[Box<dyn Token>],
) -> TokenpressResult<RunSummary> {
    let mut canvas = make_canvas(cfg)?;
    let result = place_and_save(cfg, tokens, canvas.as_mut());
    canvas.cleanup();
    if let Ok(summary) = &result {
        tracing::info!(
            canvas = %summary.canvas,
            pages = summary.pages,
            path = %summary.output.display(),
            "done"
        );
    }
    result
}

/// Arrange `tokens` on pages of the configured size and margin.
///
/// Returns the layout description and the placements in full-page coordinates.
pub fn arrange_tokens(
    cfg: &RunConfig,
    tokens: &[Box<dyn Token>],
) -> TokenpressResult<(String, Arrangement)> {
    if tokens.is_empty() {
        return Err(TokenpressError::validation("no tokens to place"));
    }
    let items = tokens
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let s = t.footprint();
            Size::checked(s.width, s.height)
                .map(|s| (s, t.margins()))
                .map_err(|e| TokenpressError::validation(format!("token {i}: {e}")))
        })
        .collect::<TokenpressResult<Vec<(Size, Margins)>>>()?;

    let page = cfg.page_size()?;
    let margins = cfg.page_margins();
    let printable = page.shrink(margins);
    if printable.area() <= 0.0 {
        return Err(TokenpressError::validation(format!(
            "page margin {}mm leaves no printable area on a {}x{}mm page",
            cfg.page_margin, page.width, page.height
        )));
    }

    let layout = MarginLayout::new(make_layout(&cfg.packing)?);
    let supply = PageSupply::constant(page).shrink(margins);
    tracing::debug!(layout = %layout.name(), ?printable, "arranging");
    let arrangement = layout
        .arrange(&items, &supply, cfg.verbose)?
        .inset_pages(margins);
    arrangement.verify(tokens.len())?;
    Ok((layout.name(), arrangement))
}

fn place_and_save(
    cfg: &RunConfig,
    tokens: &[Box<dyn Token>],
    canvas: &mut dyn CanvasNode,
) -> TokenpressResult<RunSummary> {
    let (layout, arrangement) = arrange_tokens(cfg, tokens)?;
    tracing::info!(
        layout = %layout,
        pages = arrangement.page_count(),
        "arranged tokens"
    );

    for placed in &arrangement.pages {
        let page = canvas.create_page(placed.size, None)?;
        for p in &placed.placements {
            let token = &tokens[p.token];
            let mut slot = page.view(p.rect());
            if p.rotated {
                token.draw(&mut slot.rotate_quarter())?;
            } else {
                token.draw(&mut slot)?;
            }
        }
    }

    canvas.save(cfg.verbose, false)?;
    Ok(RunSummary {
        output: cfg.output_file.clone(),
        canvas: canvas.name(),
        layout,
        pages: arrangement.page_count(),
        tokens: tokens.len(),
    })
}

#[cfg(test)]
#[path = "../tests/unit/flow.rs"]
mod tests;
