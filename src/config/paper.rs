use crate::foundation::core::Size;
use crate::foundation::error::{TokenpressError, TokenpressResult};

/// Named paper sizes in portrait millimetres.
const PAPER_SIZES: &[(&str, f64, f64)] = &[
    ("a0", 841.0, 1189.0),
    ("a1", 594.0, 841.0),
    ("a2", 420.0, 594.0),
    ("a3", 297.0, 420.0),
    ("a4", 210.0, 297.0),
    ("a5", 148.0, 210.0),
    ("a6", 105.0, 148.0),
    ("b4", 250.0, 353.0),
    ("b5", 176.0, 250.0),
    ("letter", 216.0, 279.0),
    ("legal", 216.0, 356.0),
    ("tabloid", 279.0, 432.0),
];

/// Look up a named paper size, case-insensitively.
///
/// A trailing `-landscape` / `-portrait` suffix is accepted; the result is always portrait
/// (width <= height), which is what the packer expects.
pub fn parse_paper_size(name: &str) -> TokenpressResult<Size> {
    let lowered = name.trim().to_ascii_lowercase();
    let base = lowered
        .strip_suffix("-landscape")
        .or_else(|| lowered.strip_suffix("-portrait"))
        .unwrap_or(&lowered);
    PAPER_SIZES
        .iter()
        .find(|(n, _, _)| *n == base)
        .map(|&(_, w, h)| Size::new(w, h))
        .ok_or_else(|| {
            TokenpressError::validation(format!(
                "unknown paper size '{name}' (known: {})",
                PAPER_SIZES
                    .iter()
                    .map(|(n, _, _)| *n)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })
}
