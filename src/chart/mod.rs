pub mod geometry;
pub mod panels;
pub mod render;

pub use geometry::{ChartGeometry, ChartLayout, PriceScale};
pub use render::{render_chart, ChartKind};
