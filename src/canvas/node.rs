use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::canvas::page::Page;
use crate::foundation::core::Size;
use crate::foundation::error::{TokenpressError, TokenpressResult};

/// Output of one stage when it is asked to return results instead of writing the final file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rendered {
    Text(String),
    Bytes(Vec<u8>),
}

impl Rendered {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Rendered::Text(s) => s.as_bytes(),
            Rendered::Bytes(b) => b,
        }
    }

    /// Text view of the result. Byte results are decoded lossily.
    pub fn to_text(&self) -> std::borrow::Cow<'_, str> {
        match self {
            Rendered::Text(s) => std::borrow::Cow::Borrowed(s),
            Rendered::Bytes(b) => String::from_utf8_lossy(b),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

/// One node in a canvas chain.
///
/// A chain is either a backend (which owns the pages) or a converter wrapping exactly one inner
/// node. Page creation always reaches the backend; `save` runs the chain inside-out.
pub trait CanvasNode {
    /// Declared name, e.g. `"pdf(lopdf)"` or `"html"`.
    fn name(&self) -> String;

    /// Produced format: the declared name without its variant tag.
    fn format(&self) -> String {
        base_name(&self.name()).to_string()
    }

    /// Create a page on the backend and hand it out for drawing.
    fn create_page(&mut self, size: Size, background: Option<&Path>) -> TokenpressResult<&mut Page>;

    /// Pages created so far and not yet consumed by `save`.
    fn page_count(&self) -> usize;

    /// Render everything drawn so far.
    ///
    /// With `return_result` the output comes back in memory and nothing is written to the final
    /// output path. Without it the node writes the final file(s) and returns `None`.
    fn save(&mut self, verbose: bool, return_result: bool)
    -> TokenpressResult<Option<Vec<Rendered>>>;

    /// Release every temporary resource held by this node and the nodes it wraps.
    fn cleanup(&mut self);

    fn inner(&self) -> Option<&dyn CanvasNode> {
        None
    }
}

impl std::fmt::Debug for dyn CanvasNode + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(chain_names(self)).finish()
    }
}

/// Declared names from the outermost node down to the backend.
pub fn chain_names(node: &dyn CanvasNode) -> Vec<String> {
    let mut names = vec![node.name()];
    let mut cur = node.inner();
    while let Some(n) = cur {
        names.push(n.name());
        cur = n.inner();
    }
    names
}

/// `"png(resvg)"` -> `"png"`.
pub fn base_name(name: &str) -> &str {
    name.split_once('(').map_or(name, |(base, _)| base)
}

/// Variant tag of a declared name, if any: `"png(resvg)"` -> `Some("resvg")`.
pub fn variant_tag(name: &str) -> Option<&str> {
    let (_, rest) = name.split_once('(')?;
    rest.strip_suffix(')')
}

/// A converter step: turns the inner node's in-memory results into this node's format.
pub trait Converter {
    /// Declared name of the produced format.
    fn name(&self) -> String;

    /// Convert `inputs` (one per inner result) produced from pages of `sizes`.
    fn convert(
        &mut self,
        inputs: Vec<Rendered>,
        sizes: &[Size],
        verbose: bool,
        return_result: bool,
    ) -> TokenpressResult<Option<Vec<Rendered>>>;

    /// Delete temp resources created by `convert`.
    fn cleanup(&mut self) {}
}

/// Adapts a [`Converter`] into a [`CanvasNode`] wrapping an inner node.
pub struct ConvertNode<C> {
    inner: Box<dyn CanvasNode>,
    converter: C,
    sizes: Vec<Size>,
}

impl<C: Converter> ConvertNode<C> {
    pub fn new(inner: Box<dyn CanvasNode>, converter: C) -> Self {
        Self {
            inner,
            converter,
            sizes: Vec::new(),
        }
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    fn save_inner(
        &mut self,
        verbose: bool,
        return_result: bool,
    ) -> TokenpressResult<Option<Vec<Rendered>>> {
        let inputs = self.inner.save(verbose, true)?.ok_or_else(|| {
            TokenpressError::configuration(format!(
                "'{}' returned no result to '{}'",
                self.inner.name(),
                self.converter.name()
            ))
        })?;
        let sizes = std::mem::take(&mut self.sizes);
        tracing::debug!(
            from = %self.inner.name(),
            to = %self.converter.name(),
            inputs = inputs.len(),
            "converting"
        );
        self.converter
            .convert(inputs, &sizes, verbose, return_result)
    }
}

impl<C: Converter> CanvasNode for ConvertNode<C> {
    fn name(&self) -> String {
        self.converter.name()
    }

    fn create_page(&mut self, size: Size, background: Option<&Path>) -> TokenpressResult<&mut Page> {
        self.sizes.push(size);
        self.inner.create_page(size, background)
    }

    fn page_count(&self) -> usize {
        self.inner.page_count()
    }

    fn save(
        &mut self,
        verbose: bool,
        return_result: bool,
    ) -> TokenpressResult<Option<Vec<Rendered>>> {
        let result = self.save_inner(verbose, return_result);
        self.cleanup();
        result
    }

    fn cleanup(&mut self) {
        self.converter.cleanup();
        self.inner.cleanup();
    }

    fn inner(&self) -> Option<&dyn CanvasNode> {
        Some(self.inner.as_ref())
    }
}

/// `out.png` -> `out_3.png`.
pub fn numbered_output(path: &Path, index: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{index}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{index}"),
    };
    path.with_file_name(name)
}

/// Output path of page `index` out of `total` for a per-page format.
pub fn page_output(path: &Path, index: usize, total: usize) -> PathBuf {
    if total > 1 {
        numbered_output(path, index)
    } else {
        path.to_path_buf()
    }
}

/// Refuse to write several per-page outputs unless numbered files were requested.
pub fn check_page_outputs(what: &str, pages: usize, split_pages: bool) -> TokenpressResult<()> {
    if pages > 1 && !split_pages {
        return Err(TokenpressError::unsupported_multi_page(format!(
            "{what} produced {pages} pages but writes one file per page; set split_pages to write numbered files"
        )));
    }
    Ok(())
}

/// Write per-page results to the final output path(s).
pub fn write_outputs(
    path: &Path,
    outputs: &[Rendered],
    what: &str,
    split_pages: bool,
) -> TokenpressResult<Vec<PathBuf>> {
    check_page_outputs(what, outputs.len(), split_pages)?;
    ensure_parent_dir(path)?;
    let mut written = Vec::with_capacity(outputs.len());
    for (i, out) in outputs.iter().enumerate() {
        let target = page_output(path, i, outputs.len());
        std::fs::write(&target, out.as_bytes())
            .with_context(|| format!("write '{}'", target.display()))?;
        tracing::info!(path = %target.display(), bytes = out.len(), "wrote output");
        written.push(target);
    }
    Ok(written)
}

pub fn ensure_parent_dir(path: &Path) -> TokenpressResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/node.rs"]
mod tests;
