//! Model selection between the NoiseOnly and Full variants.

pub mod bayes;

pub use bayes::*;
