//! Chart rendering and output.

pub mod chart;
pub mod render;

pub use render::write_output;
