//! tokenpress arranges printable tokens onto pages and writes them through a composable output
//! pipeline.
//!
//! # Overview
//!
//! 1. **Compose**: [`make_canvas`] resolves the target format through the [`FormatGraph`] into a
//!    chain of canvas nodes, e.g. `pdf(chromium) <- html <- svg(native)`.
//! 2. **Arrange**: a [`Layout`] packs token footprints onto a lazy [`PageSupply`], optionally
//!    searching many packing strategies in parallel ([`BestOf`]).
//! 3. **Draw and save**: tokens draw into page views; `save` runs the chain inside-out, calling
//!    external tools where a converter needs one, and cleans up every intermediate file.
//!
//! [`run`] ties the three together for a [`RunConfig`].
#![forbid(unsafe_code)]

pub mod canvas;
pub mod config;
pub mod flow;
pub mod foundation;
pub mod layout;
pub mod token;

pub use canvas::{
    CanvasNode, ConvertNode, Converter, FormatEntry, FormatGraph, Page, PageView, Rendered, Shape,
    Stroke, StrokeStyle, make_canvas,
};
pub use config::{Choice, LayoutKind, LayoutOptions, PageSpec, RunConfig};
pub use flow::{RunSummary, arrange_tokens, run, run_with_tokens};
pub use foundation::core::{Color, Margins, Size};
pub use foundation::error::{TokenpressError, TokenpressResult};
pub use layout::{
    Arrangement, BestOf, BinAlgo, Layout, MarginLayout, PackAlgo, PageSupply, PlacedPage,
    Placement, RectPackLayout, SortAlgo, make_layout,
};
pub use token::{CardSpec, CardToken, Token, cards_from_specs};
