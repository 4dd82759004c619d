//! In-process SVG to PNG rasterisation with `resvg`.

use std::io::Cursor;
use std::path::PathBuf;

use anyhow::Context as _;

use crate::canvas::node::{Converter, Rendered, check_page_outputs, write_outputs};
use crate::config::RunConfig;
use crate::foundation::core::Size;
use crate::foundation::error::{TokenpressError, TokenpressResult};

/// CSS pixels per inch; usvg resolves `mm` lengths at this resolution.
const CSS_DPI: f32 = 96.0;
const MAX_DIM: u32 = 16_384;

pub struct SvgToPng {
    output: PathBuf,
    dpi: f32,
    split_pages: bool,
}

impl SvgToPng {
    pub const NAME: &'static str = "png(native)";

    pub fn new(cfg: &RunConfig) -> Self {
        Self {
            output: cfg.output_file.clone(),
            dpi: cfg.png_dpi,
            split_pages: cfg.split_pages,
        }
    }
}

impl Converter for SvgToPng {
    fn name(&self) -> String {
        Self::NAME.to_string()
    }

    fn convert(
        &mut self,
        inputs: Vec<Rendered>,
        _sizes: &[Size],
        _verbose: bool,
        return_result: bool,
    ) -> TokenpressResult<Option<Vec<Rendered>>> {
        if !return_result {
            check_page_outputs(Self::NAME, inputs.len(), self.split_pages)?;
        }
        let mut opts = usvg::Options::default();
        opts.fontdb_mut().load_system_fonts();

        let pngs = inputs
            .iter()
            .enumerate()
            .map(|(i, svg)| {
                rasterize_to_png(svg.as_bytes(), &opts, self.dpi)
                    .map(Rendered::Bytes)
                    .map_err(|e| match e {
                        TokenpressError::Other(err) => {
                            TokenpressError::Other(err.context(format!("rasterize page {i}")))
                        }
                        other => other,
                    })
            })
            .collect::<TokenpressResult<Vec<_>>>()?;

        if return_result {
            return Ok(Some(pngs));
        }
        write_outputs(&self.output, &pngs, Self::NAME, self.split_pages)?;
        Ok(None)
    }
}

/// Render one SVG document at `dpi` and encode it as PNG with straight alpha.
pub fn rasterize_to_png(svg: &[u8], opts: &usvg::Options<'_>, dpi: f32) -> TokenpressResult<Vec<u8>> {
    let tree = usvg::Tree::from_data(svg, opts).context("parse svg tree")?;
    let scale = dpi / CSS_DPI;
    let width = to_px(tree.size().width() * scale)?;
    let height = to_px(tree.size().height() * scale)?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| TokenpressError::validation("failed to allocate svg pixmap"))?;
    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );

    let mut rgba = pixmap.take();
    unpremultiply_rgba8_in_place(&mut rgba);
    let img = image::RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| TokenpressError::validation("pixmap size mismatch"))?;
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

fn to_px(v: f32) -> TokenpressResult<u32> {
    if !v.is_finite() || v <= 0.0 {
        return Err(TokenpressError::validation("svg has invalid width/height"));
    }
    let px = (v.ceil() as u32).max(1);
    if px > MAX_DIM {
        return Err(TokenpressError::validation(format!(
            "raster size too large: {px}px (max {MAX_DIM}); lower png_dpi"
        )));
    }
    Ok(px)
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/raster.rs"]
mod tests;
