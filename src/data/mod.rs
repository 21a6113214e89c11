//! Experiment data input.

pub mod loader;

pub use loader::*;
