//! Run configuration.
//!
//! A [`RunConfig`] is the configuration bag shared by the composer, the converters and the
//! layout factory. It is loaded from JSON and is read-mostly once the canvas chain is built.

mod paper;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::core::{Margins, Size};
use crate::foundation::error::{TokenpressError, TokenpressResult};
use crate::token::CardSpec;

pub use paper::parse_paper_size;

/// Page size as a paper name (`"A4"`) or explicit `[width, height]` in millimetres.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum PageSpec {
    Named(String),
    Dims([f64; 2]),
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::Named("A4".to_string())
    }
}

impl PageSpec {
    pub fn resolve(&self) -> TokenpressResult<Size> {
        match self {
            PageSpec::Named(name) => parse_paper_size(name),
            PageSpec::Dims([w, h]) => Size::checked(*w, *h),
        }
    }
}

/// One option value, a list of them, or `"all"`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Choice {
    One(String),
    Many(Vec<String>),
}

impl Choice {
    /// Expand into concrete names. `None` means "every known value".
    pub fn names(&self) -> Option<Vec<String>> {
        match self {
            Choice::One(s) if s.eq_ignore_ascii_case("all") => None,
            Choice::One(s) => Some(vec![s.clone()]),
            Choice::Many(v) => Some(v.clone()),
        }
    }
}

/// Which layout search to build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    /// Best-of search over the cross product of the configured options.
    #[default]
    Best,
    /// A single packing strategy.
    Single,
}

/// Layout options, flattened into [`RunConfig`].
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub layout: LayoutKind,
    pub bin_algo: Option<Choice>,
    pub pack_algo: Option<Choice>,
    pub sort_algo: Option<Choice>,
    pub rotation: Option<bool>,
    /// Worker threads for the best-of search. `None` uses rayon defaults.
    pub threads: Option<usize>,
}

/// The configuration bag for one run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Final output path.
    pub output_file: PathBuf,
    /// Target format. Defaults to the extension of `output_file`.
    pub output_format: Option<String>,
    /// Explicit format-graph entry to build instead of `output_format`.
    pub canvas: Option<String>,
    /// Declared name of the outermost node of the last composed chain, e.g. `pdf(lopdf)`.
    #[serde(skip)]
    pub resolved_canvas: Option<String>,
    /// User format-graph entries (`name -> source name`), merged over the built-ins.
    pub canvas_formats: BTreeMap<String, String>,
    /// Variant tag priority used when a name only exists as `name(tag)` entries.
    pub format_priority: Vec<String>,
    /// Preferred variant tag for `html2pdf`.
    pub html2pdf_converter: Option<String>,
    /// Tool name -> executable path overrides.
    pub executables: BTreeMap<String, PathBuf>,
    /// Exclusive binary root override.
    pub bin_dir: Option<PathBuf>,
    /// Directory for intermediate files. Defaults to the system temp directory.
    pub temp_dir: Option<PathBuf>,
    pub page_size: PageSpec,
    /// Printer margin applied to every page, in millimetres.
    pub page_margin: f64,
    #[serde(flatten)]
    pub packing: LayoutOptions,
    /// Upper bound for one external conversion. `None` waits indefinitely.
    pub conversion_timeout_secs: Option<u64>,
    /// Quiet period after which an idle-polled engine is considered done.
    pub idle_threshold_ms: u64,
    /// Interval between idle checks.
    pub idle_poll_ms: u64,
    /// Virtual time budget handed to the blocking browser converter.
    pub browser_budget_ms: u64,
    /// Raster resolution for PNG output.
    pub png_dpi: f32,
    /// Write one numbered file per page (`out_0.svg`, `out_1.svg`, ...) for per-page formats.
    pub split_pages: bool,
    pub verbose: bool,
    pub tokens: Vec<CardSpec>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from("output.pdf"),
            output_format: None,
            canvas: None,
            resolved_canvas: None,
            canvas_formats: BTreeMap::new(),
            format_priority: default_format_priority(),
            html2pdf_converter: None,
            executables: BTreeMap::new(),
            bin_dir: None,
            temp_dir: None,
            page_size: PageSpec::default(),
            page_margin: 0.0,
            packing: LayoutOptions::default(),
            conversion_timeout_secs: Some(120),
            idle_threshold_ms: 1000,
            idle_poll_ms: 1000,
            browser_budget_ms: 10_000,
            png_dpi: 150.0,
            split_pages: false,
            verbose: false,
            tokens: Vec::new(),
        }
    }
}

pub fn default_format_priority() -> Vec<String> {
    ["native", "chromium", "rsvg", "resvg", "chromium-idle"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl RunConfig {
    pub fn new(output_file: impl Into<PathBuf>) -> Self {
        Self {
            output_file: output_file.into(),
            ..Self::default()
        }
    }

    /// Load a JSON configuration file.
    ///
    /// A relative `output_file` stays relative to the working directory, matching CLI usage.
    pub fn from_path(path: impl AsRef<Path>) -> TokenpressResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: RunConfig = serde_json::from_str(&text)
            .with_context(|| format!("parse config '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = Some(format.into());
        self
    }

    pub fn with_canvas(mut self, canvas: impl Into<String>) -> Self {
        self.canvas = Some(canvas.into());
        self
    }

    pub fn with_format_entry(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.canvas_formats.insert(name.into(), source.into());
        self
    }

    pub fn with_executable(mut self, tool: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.executables.insert(tool.into(), path.into());
        self
    }

    pub fn with_bin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bin_dir = Some(dir.into());
        self
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn with_page_size(mut self, page: PageSpec) -> Self {
        self.page_size = page;
        self
    }

    pub fn with_split_pages(mut self, split: bool) -> Self {
        self.split_pages = split;
        self
    }

    pub fn with_tokens(mut self, tokens: Vec<CardSpec>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Target format: explicit `output_format`, else the output file extension.
    pub fn target_format(&self) -> TokenpressResult<String> {
        if let Some(f) = self.output_format.as_deref() {
            return Ok(f.to_ascii_lowercase());
        }
        self.output_file
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| {
                TokenpressError::configuration(format!(
                    "cannot infer output format from '{}'; set output_format",
                    self.output_file.display()
                ))
            })
    }

    pub fn page_size(&self) -> TokenpressResult<Size> {
        self.page_size.resolve()
    }

    pub fn page_margins(&self) -> Margins {
        Margins::uniform(self.page_margin)
    }

    pub fn conversion_timeout(&self) -> Option<std::time::Duration> {
        self.conversion_timeout_secs
            .map(std::time::Duration::from_secs)
    }

    pub fn validate(&self) -> TokenpressResult<()> {
        self.page_size()?;
        if !self.page_margin.is_finite() || self.page_margin < 0.0 {
            return Err(TokenpressError::validation(
                "page_margin must be finite and non-negative",
            ));
        }
        if self.packing.threads == Some(0) {
            return Err(TokenpressError::validation(
                "threads must be >= 1 when set",
            ));
        }
        if self.idle_poll_ms == 0 {
            return Err(TokenpressError::validation("idle_poll_ms must be non-zero"));
        }
        if !self.png_dpi.is_finite() || self.png_dpi <= 0.0 {
            return Err(TokenpressError::validation("png_dpi must be positive"));
        }
        for card in &self.tokens {
            card.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/mod.rs"]
mod tests;
