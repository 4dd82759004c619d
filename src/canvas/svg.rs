//! Native SVG backend: one SVG document per page.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use base64::Engine as _;

use crate::canvas::node::{CanvasNode, Rendered, check_page_outputs, write_outputs};
use crate::canvas::page::{DrawCommand, Page, Shape, Stroke};
use crate::config::RunConfig;
use crate::foundation::core::{Affine, Color, Size};
use crate::foundation::error::TokenpressResult;

/// Points to millimetres.
const PT_TO_MM: f64 = 25.4 / 72.0;

pub struct SvgCanvas {
    output: PathBuf,
    split_pages: bool,
    pages: Vec<Page>,
}

impl SvgCanvas {
    pub const NAME: &'static str = "svg(native)";

    pub fn new(cfg: &RunConfig) -> Self {
        Self {
            output: cfg.output_file.clone(),
            split_pages: cfg.split_pages,
            pages: Vec::new(),
        }
    }
}

impl CanvasNode for SvgCanvas {
    fn name(&self) -> String {
        Self::NAME.to_string()
    }

    fn create_page(&mut self, size: Size, background: Option<&Path>) -> TokenpressResult<&mut Page> {
        let index = self.pages.len();
        self.pages.push(Page::new(index, size, background));
        Ok(&mut self.pages[index])
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[tracing::instrument(skip(self), fields(pages = self.pages.len()))]
    fn save(
        &mut self,
        verbose: bool,
        return_result: bool,
    ) -> TokenpressResult<Option<Vec<Rendered>>> {
        if !return_result {
            check_page_outputs(Self::NAME, self.pages.len(), self.split_pages)?;
        }
        let pages = std::mem::take(&mut self.pages);
        let docs = pages
            .iter()
            .map(|p| render_page(p).map(Rendered::Text))
            .collect::<TokenpressResult<Vec<_>>>()?;
        if return_result {
            return Ok(Some(docs));
        }
        write_outputs(&self.output, &docs, Self::NAME, self.split_pages)?;
        Ok(None)
    }

    fn cleanup(&mut self) {}
}

/// Serialize one page as a standalone SVG document sized in millimetres.
pub fn render_page(page: &Page) -> TokenpressResult<String> {
    let Size { width, height } = page.size();
    let mut images = ImageTable::default();
    let mut body = String::new();

    if let Some(bg) = page.background() {
        let id = images.id_for(bg)?;
        let _ = writeln!(
            body,
            r##"<use xlink:href="#{id}" transform="{}"/>"##,
            matrix(Affine::scale_non_uniform(width, height))
        );
    }
    for cmd in page.commands() {
        write_command(&mut body, cmd, &mut images)?;
    }

    let mut out = String::with_capacity(body.len() + images.defs.len() + 256);
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}mm" height="{h}mm" viewBox="0 0 {w} {h}">"#,
        w = num(width),
        h = num(height)
    );
    if !images.defs.is_empty() {
        out.push_str("<defs>\n");
        out.push_str(&images.defs);
        out.push_str("</defs>\n");
    }
    out.push_str(&body);
    out.push_str("</svg>\n");
    Ok(out)
}

/// Embedded images of one page, each stored once as a unit-square `<image>`.
#[derive(Default)]
struct ImageTable {
    ids: BTreeMap<PathBuf, String>,
    defs: String,
}

impl ImageTable {
    fn id_for(&mut self, path: &Path) -> TokenpressResult<String> {
        if let Some(id) = self.ids.get(path) {
            return Ok(id.clone());
        }
        let bytes =
            std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
        let id = format!("img{}", self.ids.len());
        let data = base64::engine::general_purpose::STANDARD.encode(bytes);
        let _ = writeln!(
            self.defs,
            r#"<image id="{id}" width="1" height="1" preserveAspectRatio="none" xlink:href="data:{};base64,{data}"/>"#,
            mime_for(path)
        );
        self.ids.insert(path.to_path_buf(), id.clone());
        Ok(id)
    }
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "image/png",
    }
}

fn write_command(
    out: &mut String,
    cmd: &DrawCommand,
    images: &mut ImageTable,
) -> TokenpressResult<()> {
    let t = transform_attr(cmd.transform);
    match &cmd.shape {
        Shape::Image { rect, path } => {
            let id = images.id_for(path)?;
            let placed = cmd.transform
                * Affine::translate((rect.x0, rect.y0))
                * Affine::scale_non_uniform(rect.width(), rect.height());
            let _ = writeln!(
                out,
                r##"<use xlink:href="#{id}" transform="{}"/>"##,
                matrix(placed)
            );
        }
        Shape::Text {
            origin,
            text,
            font,
            size,
        } => {
            let _ = writeln!(
                out,
                r#"<text x="{}" y="{}" font-family="{}" font-size="{}"{t}>{}</text>"#,
                num(origin.x),
                num(origin.y),
                escape_xml(font),
                num(size * PT_TO_MM),
                escape_xml(text)
            );
        }
        Shape::Line { from, to, stroke } => {
            let _ = writeln!(
                out,
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}" fill="none"{}{t}/>"#,
                num(from.x),
                num(from.y),
                num(to.x),
                num(to.y),
                stroke_attrs(Some(stroke))
            );
        }
        Shape::Rect { rect, stroke, fill } => {
            let _ = writeln!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}"{}{}{t}/>"#,
                num(rect.x0),
                num(rect.y0),
                num(rect.width()),
                num(rect.height()),
                fill_attr(*fill),
                stroke_attrs(stroke.as_ref())
            );
        }
        Shape::Circle {
            center,
            radius,
            stroke,
            fill,
        } => {
            let _ = writeln!(
                out,
                r#"<circle cx="{}" cy="{}" r="{}"{}{}{t}/>"#,
                num(center.x),
                num(center.y),
                num(*radius),
                fill_attr(*fill),
                stroke_attrs(stroke.as_ref())
            );
        }
    }
    Ok(())
}

fn fill_attr(fill: Option<Color>) -> String {
    match fill {
        Some(c) => format!(r#" fill="{}""#, c.to_hex()),
        None => r#" fill="none""#.to_string(),
    }
}

fn stroke_attrs(stroke: Option<&Stroke>) -> String {
    let Some(stroke) = stroke else {
        return String::new();
    };
    let mut s = format!(
        r#" stroke="{}" stroke-width="{}""#,
        stroke.color.to_hex(),
        num(stroke.width)
    );
    let dashes = stroke.style.dash_array();
    if !dashes.is_empty() {
        let list = dashes.iter().map(|d| num(*d)).collect::<Vec<_>>().join(" ");
        let _ = write!(s, r#" stroke-dasharray="{list}""#);
    }
    s
}

fn transform_attr(t: Affine) -> String {
    if t == Affine::IDENTITY {
        String::new()
    } else {
        format!(r#" transform="{}""#, matrix(t))
    }
}

fn matrix(t: Affine) -> String {
    let [a, b, c, d, e, f] = t.as_coeffs();
    format!(
        "matrix({} {} {} {} {} {})",
        num(a),
        num(b),
        num(c),
        num(d),
        num(e),
        num(f)
    )
}

/// Compact number formatting: at most four decimals, no trailing zeros.
pub(crate) fn num(v: f64) -> String {
    let s = format!("{v:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" || s.is_empty() {
        "0".to_string()
    } else {
        s.to_string()
    }
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/svg.rs"]
mod tests;
