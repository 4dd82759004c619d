//! Format graph and canvas chain composition.
//!
//! The graph maps a format name either to another name it is produced from, or to a constructor
//! that builds a node. Resolving a name walks sources recursively and, after each hop from `a`
//! to `b`, wraps the result in the converter registered as `a2b` when there is one.

use std::collections::BTreeMap;

use crate::canvas::browser::HtmlToPdfIdle;
use crate::canvas::command::CommandConverter;
use crate::canvas::html::SvgToHtml;
use crate::canvas::node::{CanvasNode, ConvertNode, base_name, variant_tag};
use crate::canvas::pdf::PdfCanvas;
use crate::canvas::raster::SvgToPng;
use crate::canvas::svg::SvgCanvas;
use crate::canvas::tools::{ChromiumPrint, ResvgCli, RsvgConvert};
use crate::config::RunConfig;
use crate::foundation::error::{TokenpressError, TokenpressResult};

/// Upper bound on resolution depth, independent of the cycle check.
pub const MAX_DEPTH: usize = 16;

/// Builds one node. Converters receive the node they wrap; backends receive `None`.
pub type CanvasConstructor =
    fn(&RunConfig, Option<Box<dyn CanvasNode>>) -> TokenpressResult<Box<dyn CanvasNode>>;

#[derive(Clone)]
pub enum FormatEntry {
    /// Produced from another graph entry.
    Source(String),
    Constructor(CanvasConstructor),
}

impl std::fmt::Debug for FormatEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatEntry::Source(s) => f.debug_tuple("Source").field(s).finish(),
            FormatEntry::Constructor(_) => f.write_str("Constructor"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FormatGraph {
    entries: BTreeMap<String, FormatEntry>,
    priority: Vec<String>,
    preferred: BTreeMap<String, String>,
}

impl Default for FormatGraph {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FormatGraph {
    /// An empty graph with the given variant priority.
    pub fn empty(priority: Vec<String>) -> Self {
        Self {
            entries: BTreeMap::new(),
            priority,
            preferred: BTreeMap::new(),
        }
    }

    /// The built-in entries.
    pub fn builtin() -> Self {
        let mut g = Self::empty(crate::config::default_format_priority());
        g.insert_source("pdf", "lopdf");
        g.insert_source("html", "svg");
        g.insert_source("svg", "vector");
        g.insert_source("png", "svg");
        g.insert_constructor("lopdf", make_pdf);
        g.insert_constructor("vector", make_svg);
        g.insert_constructor("svg2html", make_svg2html);
        g.insert_constructor("svg2png(native)", make_svg2png_native);
        g.insert_constructor("svg2png(resvg)", make_svg2png_resvg);
        g.insert_constructor("svg2pdf(rsvg)", make_svg2pdf_rsvg);
        g.insert_constructor("html2pdf(chromium)", make_html2pdf_chromium);
        g.insert_constructor("html2pdf(chromium-idle)", make_html2pdf_idle);
        g
    }

    /// Built-ins merged with the user entries and priorities from `cfg`.
    pub fn for_config(cfg: &RunConfig) -> Self {
        let mut g = Self::builtin();
        for (name, source) in &cfg.canvas_formats {
            g.insert_source(name.clone(), source.clone());
        }
        g.priority = cfg.format_priority.clone();
        if let Some(tag) = &cfg.html2pdf_converter {
            g.preferred.insert("html2pdf".to_string(), tag.clone());
        }
        g
    }

    pub fn insert_source(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.entries
            .insert(name.into(), FormatEntry::Source(source.into()));
    }

    pub fn insert_constructor(&mut self, name: impl Into<String>, ctor: CanvasConstructor) {
        self.entries
            .insert(name.into(), FormatEntry::Constructor(ctor));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entry(&self, name: &str) -> Option<&FormatEntry> {
        self.entries.get(name)
    }

    /// Find `name`, falling back to its `name(tag)` variants in priority order.
    ///
    /// Tags missing from the priority list come after the listed ones, in lexical order.
    pub fn lookup(&self, name: &str) -> Option<(&str, &FormatEntry)> {
        if let Some((key, entry)) = self.entries.get_key_value(name) {
            return Some((key.as_str(), entry));
        }
        let preferred = self.preferred.get(name);
        self.entries
            .iter()
            .filter(|(key, _)| variant_tag(key).is_some() && base_name(key) == name)
            .min_by_key(|(key, _)| {
                let tag = variant_tag(key).unwrap_or_default();
                let rank = if preferred.is_some_and(|p| p == tag) {
                    0
                } else {
                    self.priority
                        .iter()
                        .position(|p| p == tag)
                        .map_or(usize::MAX, |i| i + 1)
                };
                (rank, tag.to_string())
            })
            .map(|(key, entry)| (key.as_str(), entry))
    }

    /// Build the chain that produces `name`.
    pub fn resolve(&self, name: &str, cfg: &RunConfig) -> TokenpressResult<Box<dyn CanvasNode>> {
        let mut stack = Vec::new();
        self.resolve_inner(name, cfg, None, &mut stack)
    }

    fn resolve_inner(
        &self,
        name: &str,
        cfg: &RunConfig,
        inner: Option<Box<dyn CanvasNode>>,
        stack: &mut Vec<String>,
    ) -> TokenpressResult<Box<dyn CanvasNode>> {
        let (key, entry) = self
            .lookup(name)
            .ok_or_else(|| TokenpressError::unsupported_format(name))?;
        if stack.iter().any(|s| s == key) || stack.len() >= MAX_DEPTH {
            let mut path = stack.clone();
            path.push(key.to_string());
            return Err(TokenpressError::format_cycle(path.join(" -> ")));
        }

        stack.push(key.to_string());
        let result = match entry {
            FormatEntry::Constructor(ctor) => ctor(cfg, inner),
            FormatEntry::Source(source) => {
                self.resolve_source(base_name(key), source, cfg, inner, stack)
            }
        };
        stack.pop();
        result
    }

    fn resolve_source(
        &self,
        name: &str,
        source: &str,
        cfg: &RunConfig,
        inner: Option<Box<dyn CanvasNode>>,
        stack: &mut Vec<String>,
    ) -> TokenpressResult<Box<dyn CanvasNode>> {
        let node = self.resolve_inner(source, cfg, inner, stack)?;
        let converter = format!("{}2{}", base_name(source), name);
        if self.lookup(&converter).is_some() {
            tracing::debug!(%converter, "wrapping with converter");
            self.resolve_inner(&converter, cfg, Some(node), stack)
        } else {
            Ok(node)
        }
    }
}

/// Build the canvas chain for `cfg`.
///
/// Uses `cfg.canvas` when set, else the target format. On success `cfg.resolved_canvas` holds
/// the declared name of the outermost node and `cfg.output_format` the target format. The
/// request itself is left alone, so the same config composes again.
#[tracing::instrument(skip(cfg), fields(output = %cfg.output_file.display()))]
pub fn make_canvas(cfg: &mut RunConfig) -> TokenpressResult<Box<dyn CanvasNode>> {
    let target = cfg.target_format()?;
    let graph = FormatGraph::for_config(cfg);
    let name = cfg.canvas.clone().unwrap_or_else(|| target.clone());
    if graph.lookup(&name).is_none() {
        return Err(TokenpressError::unsupported_format(name));
    }

    cfg.output_format = Some(target);
    let canvas = graph.resolve(&name, cfg)?;
    tracing::info!(
        requested = %name,
        chain = ?canvas,
        "composed canvas"
    );
    cfg.resolved_canvas = Some(canvas.name());
    Ok(canvas)
}

fn require_inner(
    name: &str,
    inner: Option<Box<dyn CanvasNode>>,
) -> TokenpressResult<Box<dyn CanvasNode>> {
    inner.ok_or_else(|| {
        TokenpressError::configuration(format!("converter '{name}' needs an inner canvas"))
    })
}

fn refuse_inner(name: &str, inner: &Option<Box<dyn CanvasNode>>) -> TokenpressResult<()> {
    match inner {
        Some(node) => Err(TokenpressError::configuration(format!(
            "backend '{name}' cannot wrap '{}'",
            node.name()
        ))),
        None => Ok(()),
    }
}

fn make_pdf(
    cfg: &RunConfig,
    inner: Option<Box<dyn CanvasNode>>,
) -> TokenpressResult<Box<dyn CanvasNode>> {
    refuse_inner(PdfCanvas::NAME, &inner)?;
    Ok(Box::new(PdfCanvas::new(cfg)))
}

fn make_svg(
    cfg: &RunConfig,
    inner: Option<Box<dyn CanvasNode>>,
) -> TokenpressResult<Box<dyn CanvasNode>> {
    refuse_inner(SvgCanvas::NAME, &inner)?;
    Ok(Box::new(SvgCanvas::new(cfg)))
}

fn make_svg2html(
    cfg: &RunConfig,
    inner: Option<Box<dyn CanvasNode>>,
) -> TokenpressResult<Box<dyn CanvasNode>> {
    let inner = require_inner("svg2html", inner)?;
    Ok(Box::new(ConvertNode::new(inner, SvgToHtml::new(cfg))))
}

fn make_svg2png_native(
    cfg: &RunConfig,
    inner: Option<Box<dyn CanvasNode>>,
) -> TokenpressResult<Box<dyn CanvasNode>> {
    let inner = require_inner("svg2png(native)", inner)?;
    Ok(Box::new(ConvertNode::new(inner, SvgToPng::new(cfg))))
}

fn make_svg2png_resvg(
    cfg: &RunConfig,
    inner: Option<Box<dyn CanvasNode>>,
) -> TokenpressResult<Box<dyn CanvasNode>> {
    let inner = require_inner("svg2png(resvg)", inner)?;
    let tool = ResvgCli { dpi: cfg.png_dpi };
    Ok(Box::new(ConvertNode::new(
        inner,
        CommandConverter::new(tool, cfg),
    )))
}

fn make_svg2pdf_rsvg(
    cfg: &RunConfig,
    inner: Option<Box<dyn CanvasNode>>,
) -> TokenpressResult<Box<dyn CanvasNode>> {
    let inner = require_inner("svg2pdf(rsvg)", inner)?;
    Ok(Box::new(ConvertNode::new(
        inner,
        CommandConverter::new(RsvgConvert, cfg),
    )))
}

fn make_html2pdf_chromium(
    cfg: &RunConfig,
    inner: Option<Box<dyn CanvasNode>>,
) -> TokenpressResult<Box<dyn CanvasNode>> {
    let inner = require_inner("html2pdf(chromium)", inner)?;
    let tool = ChromiumPrint {
        budget_ms: cfg.browser_budget_ms,
    };
    Ok(Box::new(ConvertNode::new(
        inner,
        CommandConverter::new(tool, cfg),
    )))
}

fn make_html2pdf_idle(
    cfg: &RunConfig,
    inner: Option<Box<dyn CanvasNode>>,
) -> TokenpressResult<Box<dyn CanvasNode>> {
    let inner = require_inner("html2pdf(chromium-idle)", inner)?;
    Ok(Box::new(ConvertNode::new(inner, HtmlToPdfIdle::new(cfg))))
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/composer.rs"]
mod tests;
