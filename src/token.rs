//! Tokens: the rectangular items that get packed onto pages.

use std::path::PathBuf;

use crate::canvas::page::{PageView, Stroke, StrokeStyle};
use crate::foundation::core::{Color, Margins, Point, Size};
use crate::foundation::error::{TokenpressError, TokenpressResult};

/// Something that occupies a rectangle on a page and knows how to draw itself there.
pub trait Token: Send + Sync {
    /// Upright footprint in millimetres, excluding margins.
    fn footprint(&self) -> Size;

    /// Spacing kept free around the footprint.
    fn margins(&self) -> Margins {
        Margins::ZERO
    }

    /// Draw into `view`, whose size equals [`Token::footprint`].
    fn draw(&self, view: &mut PageView<'_>) -> TokenpressResult<()>;
}

fn default_count() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_font_size() -> f64 {
    8.0
}

/// A plain card as listed in the run configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CardSpec {
    pub width: f64,
    pub height: f64,
    /// Copies to place.
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default)]
    pub margins: Margins,
    /// Face image, stretched over the whole card.
    #[serde(default)]
    pub image: Option<PathBuf>,
    #[serde(default)]
    pub label: Option<String>,
    /// Font size of the label in points.
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_true")]
    pub border: bool,
    #[serde(default)]
    pub border_style: StrokeStyle,
}

impl CardSpec {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            count: 1,
            margins: Margins::ZERO,
            image: None,
            label: None,
            font_size: default_font_size(),
            border: true,
            border_style: StrokeStyle::Solid,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<PathBuf>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn validate(&self) -> TokenpressResult<()> {
        Size::checked(self.width, self.height)?;
        self.margins.validate()?;
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(TokenpressError::validation(format!(
                "font_size must be positive, got {}",
                self.font_size
            )));
        }
        Ok(())
    }
}

/// Draws a [`CardSpec`]: optional face image, optional border, optional label.
#[derive(Clone, Debug)]
pub struct CardToken {
    spec: CardSpec,
}

impl CardToken {
    pub fn new(spec: CardSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &CardSpec {
        &self.spec
    }
}

impl Token for CardToken {
    fn footprint(&self) -> Size {
        Size::new(self.spec.width, self.spec.height)
    }

    fn margins(&self) -> Margins {
        self.spec.margins
    }

    fn draw(&self, view: &mut PageView<'_>) -> TokenpressResult<()> {
        let size = view.size();
        let outline = size.to_rect();
        if let Some(image) = &self.spec.image {
            view.image(outline, image.clone());
        }
        if self.spec.border {
            let stroke = Stroke::new(Color::BLACK, 0.3).with_style(self.spec.border_style);
            view.rect(outline, Some(stroke), None);
        }
        if let Some(label) = &self.spec.label {
            // Baseline sits half a line above the bottom edge.
            let line = self.spec.font_size * 25.4 / 72.0;
            let origin = Point::new(line * 0.5, (size.height - line * 0.5).max(line));
            view.text(origin, label.clone(), "Helvetica", self.spec.font_size);
        }
        Ok(())
    }
}

/// Expand card specs into tokens, repeating each one `count` times.
pub fn cards_from_specs(specs: &[CardSpec]) -> Vec<Box<dyn Token>> {
    specs
        .iter()
        .flat_map(|spec| {
            std::iter::repeat_n(spec, spec.count)
                .map(|s| Box::new(CardToken::new(s.clone())) as Box<dyn Token>)
        })
        .collect()
}

#[cfg(test)]
#[path = "../tests/unit/token.rs"]
mod tests;
