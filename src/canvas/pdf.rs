//! Native PDF backend on top of `lopdf`.
//!
//! Pages are laid out in millimetres with the origin at the top-left corner. Each content stream
//! starts with a `cm` that maps that space onto PDF points with the origin at the bottom-left.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

use crate::canvas::node::{CanvasNode, Rendered, ensure_parent_dir};
use crate::canvas::page::{DrawCommand, Page, Shape, Stroke};
use crate::canvas::svg::num;
use crate::config::RunConfig;
use crate::foundation::core::{Affine, Color, Point, Rect, Size};
use crate::foundation::error::TokenpressResult;

const MM_TO_PT: f64 = 72.0 / 25.4;
/// Control point distance for a quarter circle drawn with one cubic.
const KAPPA: f64 = 0.552_284_749_8;

pub struct PdfCanvas {
    output: PathBuf,
    pages: Vec<Page>,
}

impl PdfCanvas {
    pub const NAME: &'static str = "pdf(lopdf)";

    pub fn new(cfg: &RunConfig) -> Self {
        Self {
            output: cfg.output_file.clone(),
            pages: Vec::new(),
        }
    }
}

impl CanvasNode for PdfCanvas {
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
        _verbose: bool,
        return_result: bool,
    ) -> TokenpressResult<Option<Vec<Rendered>>> {
        let pages = std::mem::take(&mut self.pages);
        let bytes = render_document(&pages)?;
        if return_result {
            return Ok(Some(vec![Rendered::Bytes(bytes)]));
        }
        ensure_parent_dir(&self.output)?;
        std::fs::write(&self.output, &bytes)
            .with_context(|| format!("write '{}'", self.output.display()))?;
        tracing::info!(path = %self.output.display(), bytes = bytes.len(), "wrote output");
        Ok(None)
    }

    fn cleanup(&mut self) {}
}

/// Build a complete PDF document from `pages`.
pub fn render_document(pages: &[Page]) -> TokenpressResult<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut images = ImageTable::default();
    let mut page_ids = Vec::with_capacity(pages.len());
    for page in pages {
        let content = page_content(page, &mut doc, &mut images)?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let Size { width, height } = page.size();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                real(width * MM_TO_PT),
                real(height * MM_TO_PT),
            ],
        });
        page_ids.push(page_id);
    }

    // One shared resource dictionary; every page may reference any image.
    let mut xobjects = lopdf::Dictionary::new();
    for (name, id) in &images.names {
        xobjects.set(name.as_bytes().to_vec(), *id);
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
        "XObject" => xobjects,
    });
    for page_id in &page_ids {
        if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(*page_id) {
            dict.set("Resources", resources_id);
        }
    }

    let count = page_ids.len() as i64;
    let kids: Vec<Object> = page_ids.iter().map(|id| Object::from(*id)).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

#[derive(Default)]
struct ImageTable {
    by_path: BTreeMap<PathBuf, String>,
    names: BTreeMap<String, ObjectId>,
}

impl ImageTable {
    fn name_for(&mut self, path: &Path, doc: &mut Document) -> TokenpressResult<String> {
        if let Some(name) = self.by_path.get(path) {
            return Ok(name.clone());
        }
        let decoded =
            image::open(path).with_context(|| format!("decode image '{}'", path.display()))?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        let mut alpha = Vec::with_capacity((width * height) as usize);
        let mut has_alpha = false;
        for pixel in rgba.pixels() {
            let [r, g, b, a] = pixel.0;
            has_alpha |= a != 255;
            rgb.extend_from_slice(&[r, g, b]);
            alpha.push(a);
        }

        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        };
        if has_alpha {
            let smask_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(width),
                    "Height" => i64::from(height),
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                alpha,
            ));
            dict.set("SMask", smask_id);
        }
        let id = doc.add_object(Stream::new(dict, rgb));
        let name = format!("Im{}", self.names.len());
        self.names.insert(name.clone(), id);
        self.by_path.insert(path.to_path_buf(), name.clone());
        Ok(name)
    }
}

fn real(v: f64) -> Object {
    Object::Real(v as _)
}

fn page_content(
    page: &Page,
    doc: &mut Document,
    images: &mut ImageTable,
) -> TokenpressResult<String> {
    let mut out = String::new();
    let height_pt = page.size().height * MM_TO_PT;
    let _ = writeln!(
        out,
        "{} 0 0 {} 0 {} cm",
        num(MM_TO_PT),
        num(-MM_TO_PT),
        num(height_pt)
    );
    if let Some(bg) = page.background() {
        let name = images.name_for(bg, doc)?;
        draw_image(&mut out, &name, page.size().to_rect());
    }
    for cmd in page.commands() {
        write_command(&mut out, cmd, doc, images)?;
    }
    Ok(out)
}

fn write_command(
    out: &mut String,
    cmd: &DrawCommand,
    doc: &mut Document,
    images: &mut ImageTable,
) -> TokenpressResult<()> {
    out.push_str("q\n");
    if cmd.transform != Affine::IDENTITY {
        let [a, b, c, d, e, f] = cmd.transform.as_coeffs();
        let _ = writeln!(
            out,
            "{} {} {} {} {} {} cm",
            num(a),
            num(b),
            num(c),
            num(d),
            num(e),
            num(f)
        );
    }
    match &cmd.shape {
        Shape::Image { rect, path } => {
            let name = images.name_for(path, doc)?;
            draw_image(out, &name, *rect);
        }
        Shape::Text {
            origin, text, size, ..
        } => {
            let size_mm = size / MM_TO_PT;
            // Flip back so glyphs are upright in the y-down page space.
            let _ = writeln!(
                out,
                "BT /F1 {} Tf 1 0 0 -1 {} {} Tm ({}) Tj ET",
                num(size_mm),
                num(origin.x),
                num(origin.y),
                escape_pdf_string(text)
            );
        }
        Shape::Line { from, to, stroke } => {
            set_stroke(out, stroke);
            let _ = writeln!(
                out,
                "{} {} m {} {} l S",
                num(from.x),
                num(from.y),
                num(to.x),
                num(to.y)
            );
        }
        Shape::Rect { rect, stroke, fill } => {
            let _ = writeln!(
                out,
                "{} {} {} {} re",
                num(rect.x0),
                num(rect.y0),
                num(rect.width()),
                num(rect.height())
            );
            paint(out, stroke.as_ref(), *fill);
        }
        Shape::Circle {
            center,
            radius,
            stroke,
            fill,
        } => {
            circle_path(out, *center, *radius);
            paint(out, stroke.as_ref(), *fill);
        }
    }
    out.push_str("Q\n");
    Ok(())
}

fn draw_image(out: &mut String, name: &str, rect: Rect) {
    // Image space has row 0 at y = 1; map it to the rectangle's top edge.
    let _ = writeln!(
        out,
        "q {} 0 0 {} {} {} cm /{name} Do Q",
        num(rect.width()),
        num(-rect.height()),
        num(rect.x0),
        num(rect.y1)
    );
}

fn set_stroke(out: &mut String, stroke: &Stroke) {
    let [r, g, b] = stroke.color.to_unit();
    let dashes = stroke
        .style
        .dash_array()
        .iter()
        .map(|d| num(*d))
        .collect::<Vec<_>>()
        .join(" ");
    let _ = writeln!(
        out,
        "{} {} {} RG {} w [{dashes}] 0 d",
        num(f64::from(r)),
        num(f64::from(g)),
        num(f64::from(b)),
        num(stroke.width)
    );
}

fn set_fill(out: &mut String, color: Color) {
    let [r, g, b] = color.to_unit();
    let _ = writeln!(
        out,
        "{} {} {} rg",
        num(f64::from(r)),
        num(f64::from(g)),
        num(f64::from(b))
    );
}

fn paint(out: &mut String, stroke: Option<&Stroke>, fill: Option<Color>) {
    if let Some(s) = stroke {
        set_stroke(out, s);
    }
    if let Some(c) = fill {
        set_fill(out, c);
    }
    let op = match (stroke.is_some(), fill.is_some()) {
        (true, true) => "B",
        (true, false) => "S",
        (false, true) => "f",
        (false, false) => "n",
    };
    out.push_str(op);
    out.push('\n');
}

fn circle_path(out: &mut String, c: Point, r: f64) {
    let k = r * KAPPA;
    let _ = writeln!(out, "{} {} m", num(c.x + r), num(c.y));
    let quarters = [
        (c.x + r, c.y + k, c.x + k, c.y + r, c.x, c.y + r),
        (c.x - k, c.y + r, c.x - r, c.y + k, c.x - r, c.y),
        (c.x - r, c.y - k, c.x - k, c.y - r, c.x, c.y - r),
        (c.x + k, c.y - r, c.x + r, c.y - k, c.x + r, c.y),
    ];
    for (x1, y1, x2, y2, x3, y3) in quarters {
        let _ = writeln!(
            out,
            "{} {} {} {} {} {} c",
            num(x1),
            num(y1),
            num(x2),
            num(y2),
            num(x3),
            num(y3)
        );
    }
    out.push_str("h\n");
}

/// Escape a literal string for the standard 14 fonts. Characters outside Latin-1 become `?`.
fn escape_pdf_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c if c.is_ascii() => out.push(c),
            c if (c as u32) <= 0xff => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            _ => out.push('?'),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/pdf.rs"]
mod tests;
