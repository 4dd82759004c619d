//! Per-token margins around any [`Layout`].

use crate::foundation::core::{Margins, Size};
use crate::foundation::error::{TokenpressError, TokenpressResult};
use crate::layout::{Arrangement, Layout, PageSupply};

/// Packs tokens inflated by their margins, then reports the token rectangles themselves.
///
/// When the inner layout turned a token, its margins are turned with it so the token lands
/// where its own (unturned) margins say it should.
pub struct MarginLayout {
    inner: Box<dyn Layout>,
}

impl MarginLayout {
    pub fn new(inner: Box<dyn Layout>) -> Self {
        Self { inner }
    }

    pub fn name(&self) -> String {
        format!("Margins({})", self.inner.name())
    }

    pub fn arrange(
        &self,
        tokens: &[(Size, Margins)],
        pages: &PageSupply,
        verbose: bool,
    ) -> TokenpressResult<Arrangement> {
        for (i, (_, m)) in tokens.iter().enumerate() {
            m.validate()
                .map_err(|e| TokenpressError::validation(format!("token {i}: {e}")))?;
        }
        let inflated: Vec<Size> = tokens.iter().map(|(s, m)| s.grow(*m)).collect();
        let mut arrangement = self.inner.arrange(&inflated, pages, verbose)?;

        for page in &mut arrangement.pages {
            for p in &mut page.placements {
                let (_, margins) = tokens[p.token];
                let m = if p.rotated {
                    margins.rotated_clockwise()
                } else {
                    margins
                };
                p.x += m.left;
                p.y += m.top;
                p.width -= m.horizontal();
                p.height -= m.vertical();
            }
        }
        Ok(arrangement)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/margins.rs"]
mod tests;
