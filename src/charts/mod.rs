//! Charts module - static PNG chart rendering

pub mod palette;
mod renderer;

pub use renderer::{ChartKind, ChartRenderer};
