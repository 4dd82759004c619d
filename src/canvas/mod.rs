//! Output pipeline: backends that own pages, converters that wrap them, and the composer that
//! builds a chain from a target format.

pub mod browser;
pub mod command;
pub mod composer;
pub mod executable;
pub mod html;
pub mod node;
pub mod page;
pub mod pdf;
pub mod raster;
pub mod svg;
pub mod tools;

pub use composer::{FormatEntry, FormatGraph, make_canvas};
pub use node::{CanvasNode, ConvertNode, Converter, Rendered, chain_names};
pub use page::{DrawCommand, Page, PageView, Shape, Stroke, StrokeStyle};
