//! Sampler process supervision.
//!
//! - command lines per model variant (`command`)
//! - diagnostic-line classification table (`diagnostics`)
//! - process launching, real and scripted (`launcher`, `scripted`)
//! - the retrying run state machine (`orchestrator`)

pub mod command;
pub mod diagnostics;
pub mod launcher;
pub mod orchestrator;
pub mod scripted;

pub use command::*;
pub use diagnostics::*;
pub use launcher::*;
pub use orchestrator::*;
pub use scripted::*;
