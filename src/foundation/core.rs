use crate::foundation::error::{TokenpressError, TokenpressResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Tolerance used when comparing millimetre coordinates.
pub const EPSILON: f64 = 1e-6;

/// Width and height in millimetres.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Size {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Size {
    /// Create a size from width and height.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Create a validated size with finite, positive extents.
    pub fn checked(width: f64, height: f64) -> TokenpressResult<Self> {
        if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
            return Err(TokenpressError::validation(format!(
                "size must be finite and positive, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// The same size turned a quarter.
    pub fn rotated(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    pub fn area(self) -> f64 {
        self.width * self.height
    }

    /// Return `true` when a `w x h` rectangle fits inside this size.
    pub fn fits(self, other: Size) -> bool {
        other.width <= self.width + EPSILON && other.height <= self.height + EPSILON
    }

    /// Return `true` when `other` fits as is or turned a quarter.
    pub fn fits_any_orientation(self, other: Size) -> bool {
        self.fits(other) || self.fits(other.rotated())
    }

    /// Shrink by margins, clamping at zero.
    pub fn shrink(self, margins: Margins) -> Self {
        Self {
            width: (self.width - margins.horizontal()).max(0.0),
            height: (self.height - margins.vertical()).max(0.0),
        }
    }

    /// Grow by margins.
    pub fn grow(self, margins: Margins) -> Self {
        Self {
            width: self.width + margins.horizontal(),
            height: self.height + margins.vertical(),
        }
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

impl From<(f64, f64)> for Size {
    fn from((width, height): (f64, f64)) -> Self {
        Self { width, height }
    }
}

/// Per-side spacing in millimetres.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Margins {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Margins {
    pub const ZERO: Margins = Margins {
        left: 0.0,
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
    };

    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn uniform(v: f64) -> Self {
        Self::new(v, v, v, v)
    }

    pub const fn symmetric(horizontal: f64, vertical: f64) -> Self {
        Self::new(horizontal, vertical, horizontal, vertical)
    }

    pub fn horizontal(self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(self) -> f64 {
        self.top + self.bottom
    }

    /// Margins of a box after it is turned a quarter clockwise.
    ///
    /// The side that was on the left ends up on top, top goes right, and so on.
    pub fn rotated_clockwise(self) -> Self {
        Self {
            left: self.bottom,
            top: self.left,
            right: self.top,
            bottom: self.right,
        }
    }

    pub fn validate(self) -> TokenpressResult<()> {
        for v in [self.left, self.top, self.right, self.bottom] {
            if !v.is_finite() || v < 0.0 {
                return Err(TokenpressError::validation(format!(
                    "margins must be finite and non-negative, got {self:?}"
                )));
            }
        }
        Ok(())
    }
}

/// RGB colour used by draw commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb` notation.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Components scaled to `0.0..=1.0`.
    pub fn to_unit(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
