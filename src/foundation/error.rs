use std::path::PathBuf;

/// Result alias used across the crate.
pub type TokenpressResult<T> = Result<T, TokenpressError>;

/// Errors produced while composing canvases, converting output or arranging tokens.
#[derive(thiserror::Error, Debug)]
pub enum TokenpressError {
    /// The requested format (or a format it depends on) is not in the format graph.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Resolution revisited a format or exceeded the hop bound.
    #[error("format cycle: {0}")]
    FormatCycle(String),

    /// A converter was built without its inner canvas, or a required option is missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An external tool was not found in any search root.
    #[error("executable '{tool}' not found (searched: {})", display_paths(.searched))]
    ExecutableNotFound {
        /// Tool name as requested by the converter.
        tool: String,
        /// Every location that was checked, in search order.
        searched: Vec<PathBuf>,
    },

    /// An external process or engine exited unsuccessfully or timed out.
    #[error("conversion failed: `{command}` ({status}){}", stderr_suffix(.stderr))]
    ConversionFailed {
        /// Rendered command line.
        command: String,
        /// Exit status or timeout description.
        status: String,
        /// Captured diagnostic output, if any.
        stderr: String,
    },

    /// Multiple page results reached a stage that cannot combine or iterate them.
    #[error("unsupported multi-page conversion: {0}")]
    UnsupportedMultiPage(String),

    /// A token does not fit on an empty page in either orientation.
    #[error(
        "token {index} ({width:.1}x{height:.1}mm) does not fit on a {page_width:.1}x{page_height:.1}mm page"
    )]
    TokenTooLarge {
        /// Token index in the input list.
        index: usize,
        /// Token footprint width.
        width: f64,
        /// Token footprint height.
        height: f64,
        /// Width of the page the token was tried on.
        page_width: f64,
        /// Height of the page the token was tried on.
        page_height: f64,
    },

    /// An option carries an invalid value.
    #[error("validation error: {0}")]
    Validation(String),

    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapped third-party failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TokenpressError {
    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    pub fn format_cycle(msg: impl Into<String>) -> Self {
        Self::FormatCycle(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn unsupported_multi_page(msg: impl Into<String>) -> Self {
        Self::UnsupportedMultiPage(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conversion_failed(
        command: impl Into<String>,
        status: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::ConversionFailed {
            command: command.into(),
            status: status.into(),
            stderr: stderr.into(),
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "nothing".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
