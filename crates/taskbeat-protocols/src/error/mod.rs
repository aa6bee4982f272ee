//! Error types for the taskbeat protocol layer.

mod dispatch;
mod job;
mod publish;
mod registry;
mod result;

pub use dispatch::*;
pub use job::*;
pub use publish::*;
pub use registry::*;
pub use result::*;
