//! Figure rendering.

pub mod charts;
pub mod figures;

pub use figures::{render_figures, FigureSettings};
