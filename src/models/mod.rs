//! Background model implementations.
//!
//! Models are small, pure functions of the fitted medians so that the
//! pipeline, reports and plots can evaluate them on any frequency grid.

pub mod background;

pub use background::*;
