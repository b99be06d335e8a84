//! Input/output helpers.
//!
//! - star/run directory layout shared with the sampler (`layout`)
//! - numeric text tables (`table`)
//! - sampler input files (`input`)
//! - analysis JSON read/write (`export`)

pub mod export;
pub mod input;
pub mod layout;
pub mod table;

pub use export::*;
pub use input::*;
pub use layout::*;
pub use table::*;
