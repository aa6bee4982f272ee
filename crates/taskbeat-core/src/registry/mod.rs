//! Job registries.

mod tasks;

pub use tasks::TaskRegistry;
