//! The external tools the built-in format graph knows about.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::canvas::command::CommandTool;

fn flag_with_path(flag: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(flag);
    arg.push(path.as_os_str());
    arg
}

/// `rsvg-convert`: many SVG pages into one multi-page PDF.
#[derive(Clone, Debug, Default)]
pub struct RsvgConvert;

impl CommandTool for RsvgConvert {
    fn name(&self) -> String {
        "pdf(rsvg)".to_string()
    }

    fn repo(&self) -> &str {
        "rsvg-convert"
    }

    fn binary(&self) -> &str {
        "rsvg-convert"
    }

    fn input_suffix(&self) -> &str {
        ".svg"
    }

    fn output_suffix(&self) -> &str {
        ".pdf"
    }

    fn many_to_one(&self) -> bool {
        true
    }

    fn args(&self, inputs: &[PathBuf], output: &Path) -> Vec<OsString> {
        let mut args = vec![
            OsString::from("-f"),
            OsString::from("pdf"),
            OsString::from("-o"),
            output.as_os_str().to_os_string(),
        ];
        args.extend(inputs.iter().map(|p| p.as_os_str().to_os_string()));
        args
    }
}

/// The `resvg` command-line renderer: one SVG page into one PNG.
#[derive(Clone, Debug)]
pub struct ResvgCli {
    pub dpi: f32,
}

impl CommandTool for ResvgCli {
    fn name(&self) -> String {
        "png(resvg)".to_string()
    }

    fn repo(&self) -> &str {
        "resvg"
    }

    fn binary(&self) -> &str {
        "resvg"
    }

    fn input_suffix(&self) -> &str {
        ".svg"
    }

    fn output_suffix(&self) -> &str {
        ".png"
    }

    fn many_to_one(&self) -> bool {
        false
    }

    fn args(&self, inputs: &[PathBuf], output: &Path) -> Vec<OsString> {
        let mut args = vec![
            OsString::from("--dpi"),
            OsString::from(format!("{}", self.dpi.round() as u32)),
        ];
        args.extend(inputs.iter().map(|p| p.as_os_str().to_os_string()));
        args.push(output.as_os_str().to_os_string());
        args
    }
}

/// Headless Chromium printing one HTML document to PDF and exiting.
#[derive(Clone, Debug)]
pub struct ChromiumPrint {
    /// Virtual time granted to the page before printing.
    pub budget_ms: u64,
}

impl CommandTool for ChromiumPrint {
    fn name(&self) -> String {
        "pdf(chromium)".to_string()
    }

    fn repo(&self) -> &str {
        "chromium"
    }

    fn binary(&self) -> &str {
        "chromium"
    }

    fn input_suffix(&self) -> &str {
        ".html"
    }

    fn output_suffix(&self) -> &str {
        ".pdf"
    }

    fn many_to_one(&self) -> bool {
        true
    }

    fn multiple_inputs(&self) -> bool {
        false
    }

    fn args(&self, inputs: &[PathBuf], output: &Path) -> Vec<OsString> {
        let mut args = chromium_base_args();
        args.push(print_to_pdf_arg(output));
        args.push(OsString::from(format!(
            "--virtual-time-budget={}",
            self.budget_ms
        )));
        args.extend(inputs.iter().map(|p| p.as_os_str().to_os_string()));
        args
    }
}

/// Flags shared by every headless Chromium invocation.
pub fn chromium_base_args() -> Vec<OsString> {
    [
        "--headless",
        "--disable-gpu",
        "--no-sandbox",
        "--no-pdf-header-footer",
        "--allow-file-access-from-files",
    ]
    .into_iter()
    .map(OsString::from)
    .collect()
}

pub(crate) fn print_to_pdf_arg(output: &Path) -> OsString {
    flag_with_path("--print-to-pdf=", output)
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/tools.rs"]
mod tests;
