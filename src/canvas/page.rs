use std::f64::consts::FRAC_PI_2;
use std::path::{Path, PathBuf};

use crate::foundation::core::{Affine, Color, Point, Rect, Size, Vec2};

/// Dash pattern of a stroke.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dash,
    Dot,
    DotDash,
}

impl StrokeStyle {
    /// Dash array in millimetres. Empty for solid strokes.
    pub fn dash_array(self) -> &'static [f64] {
        match self {
            StrokeStyle::Solid => &[],
            StrokeStyle::Dash => &[3.0, 2.0],
            StrokeStyle::Dot => &[0.5, 1.5],
            StrokeStyle::DotDash => &[3.0, 1.5, 0.5, 1.5],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub color: Color,
    /// Line width in millimetres.
    pub width: f64,
    pub style: StrokeStyle,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            width: 0.5,
            style: StrokeStyle::Solid,
        }
    }
}

impl Stroke {
    pub fn new(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            style: StrokeStyle::Solid,
        }
    }

    pub fn with_style(mut self, style: StrokeStyle) -> Self {
        self.style = style;
        self
    }
}

/// A primitive in page-local millimetres, before its transform is applied.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Image {
        rect: Rect,
        path: PathBuf,
    },
    Text {
        origin: Point,
        text: String,
        font: String,
        /// Font size in points.
        size: f64,
    },
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
    },
    Rect {
        rect: Rect,
        stroke: Option<Stroke>,
        fill: Option<Color>,
    },
    Circle {
        center: Point,
        radius: f64,
        stroke: Option<Stroke>,
        fill: Option<Color>,
    },
}

/// One entry in a page's command log.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCommand {
    /// Maps the shape's coordinates into page space.
    pub transform: Affine,
    pub shape: Shape,
}

/// A page owned by a backend canvas.
///
/// Pages only record commands; backends turn the log into output when the canvas is saved.
#[derive(Clone, Debug)]
pub struct Page {
    index: usize,
    size: Size,
    background: Option<PathBuf>,
    commands: Vec<DrawCommand>,
}

impl Page {
    pub fn new(index: usize, size: Size, background: Option<&Path>) -> Self {
        Self {
            index,
            size,
            background: background.map(Path::to_path_buf),
            commands: Vec::new(),
        }
    }

    /// Creation order within the owning canvas.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn background(&self) -> Option<&Path> {
        self.background.as_deref()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// A view onto a sub-rectangle of the page, with its origin at the rectangle's corner.
    pub fn view(&mut self, rect: Rect) -> PageView<'_> {
        PageView {
            transform: Affine::translate((rect.x0, rect.y0)),
            size: Size::new(rect.width(), rect.height()),
            page: self,
        }
    }

    /// A view covering the whole page.
    pub fn full_view(&mut self) -> PageView<'_> {
        let rect = self.size.to_rect();
        self.view(rect)
    }

    fn push(&mut self, transform: Affine, shape: Shape) {
        self.commands.push(DrawCommand { transform, shape });
    }
}

/// A transformed window onto a [`Page`].
///
/// Coordinates passed to the draw methods are local to the view: `(0, 0)` is the view's top-left
/// corner and `size()` is its extent.
pub struct PageView<'a> {
    page: &'a mut Page,
    transform: Affine,
    size: Size,
}

impl PageView<'_> {
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn transform(&self) -> Affine {
        self.transform
    }

    pub fn page_index(&self) -> usize {
        self.page.index
    }

    /// A nested view onto a sub-rectangle of this view.
    pub fn view(&mut self, rect: Rect) -> PageView<'_> {
        PageView {
            transform: self.transform * Affine::translate((rect.x0, rect.y0)),
            size: Size::new(rect.width(), rect.height()),
            page: &mut *self.page,
        }
    }

    /// A view of the same size rotated by `radians` around its centre.
    pub fn rotate(&mut self, radians: f64) -> PageView<'_> {
        let c = Vec2::new(self.size.width / 2.0, self.size.height / 2.0);
        PageView {
            transform: self.transform
                * Affine::translate(c)
                * Affine::rotate(radians)
                * Affine::translate(-c),
            size: self.size,
            page: &mut *self.page,
        }
    }

    /// A view turned a quarter clockwise, with width and height swapped.
    ///
    /// Used when the packer placed a token rotated: the token keeps drawing in its own upright
    /// frame and the result lands in the rotated slot.
    pub fn rotate_quarter(&mut self) -> PageView<'_> {
        PageView {
            transform: self.transform
                * Affine::translate((self.size.width, 0.0))
                * Affine::rotate(FRAC_PI_2),
            size: self.size.rotated(),
            page: &mut *self.page,
        }
    }

    pub fn image(&mut self, rect: Rect, path: impl Into<PathBuf>) {
        self.page.push(
            self.transform,
            Shape::Image {
                rect,
                path: path.into(),
            },
        );
    }

    pub fn text(&mut self, origin: Point, text: impl Into<String>, font: &str, size: f64) {
        self.page.push(
            self.transform,
            Shape::Text {
                origin,
                text: text.into(),
                font: font.to_string(),
                size,
            },
        );
    }

    pub fn line(&mut self, from: Point, to: Point, stroke: Stroke) {
        self.page
            .push(self.transform, Shape::Line { from, to, stroke });
    }

    pub fn rect(&mut self, rect: Rect, stroke: Option<Stroke>, fill: Option<Color>) {
        self.page
            .push(self.transform, Shape::Rect { rect, stroke, fill });
    }

    pub fn circle(
        &mut self,
        center: Point,
        radius: f64,
        stroke: Option<Stroke>,
        fill: Option<Color>,
    ) {
        self.page.push(
            self.transform,
            Shape::Circle {
                center,
                radius,
                stroke,
                fill,
            },
        );
    }
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/page.rs"]
mod tests;
