use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Context as _;

use crate::canvas::node::{Converter, Rendered, ensure_parent_dir};
use crate::canvas::svg::num;
use crate::config::RunConfig;
use crate::foundation::core::Size;
use crate::foundation::error::{TokenpressError, TokenpressResult};

/// Combines per-page SVG documents into one printable HTML document.
///
/// Each page becomes a block followed by a page break, so a browser prints one SVG per sheet.
pub struct SvgToHtml {
    output: PathBuf,
}

impl SvgToHtml {
    pub const NAME: &'static str = "html";

    pub fn new(cfg: &RunConfig) -> Self {
        Self {
            output: cfg.output_file.clone(),
        }
    }
}

impl Converter for SvgToHtml {
    fn name(&self) -> String {
        Self::NAME.to_string()
    }

    fn convert(
        &mut self,
        inputs: Vec<Rendered>,
        sizes: &[Size],
        _verbose: bool,
        return_result: bool,
    ) -> TokenpressResult<Option<Vec<Rendered>>> {
        let html = wrap_pages(&inputs, sizes)?;
        if return_result {
            return Ok(Some(vec![Rendered::Text(html)]));
        }
        ensure_parent_dir(&self.output)?;
        std::fs::write(&self.output, &html)
            .with_context(|| format!("write '{}'", self.output.display()))?;
        tracing::info!(path = %self.output.display(), pages = inputs.len(), "wrote output");
        Ok(None)
    }
}

/// Build the HTML document. `sizes` sets the printed sheet size when every page agrees on one.
pub fn wrap_pages(pages: &[Rendered], sizes: &[Size]) -> TokenpressResult<String> {
    let mut out = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n",
    );
    if let Some(first) = sizes.first()
        && sizes.iter().all(|s| s == first)
    {
        let _ = writeln!(
            out,
            "@page {{ size: {}mm {}mm; margin: 0; }}",
            num(first.width),
            num(first.height)
        );
    }
    out.push_str(
        "html, body { margin: 0; padding: 0; }\n\
         .page { page-break-after: always; break-after: page; }\n\
         .page:last-child { page-break-after: auto; break-after: auto; }\n\
         .page svg { display: block; }\n",
    );
    out.push_str("</style>\n</head>\n<body>\n");
    for (i, page) in pages.iter().enumerate() {
        let text = page.to_text();
        let start = text.find("<svg").ok_or_else(|| {
            TokenpressError::validation(format!("page {i} is not an SVG document"))
        })?;
        out.push_str("<div class=\"page\">\n");
        out.push_str(text[start..].trim_end());
        out.push_str("\n</div>\n");
    }
    out.push_str("</body>\n</html>\n");
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/html.rs"]
mod tests;
