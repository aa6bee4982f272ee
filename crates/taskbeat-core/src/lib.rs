//! # taskbeat Core
//!
//! Concrete job registry and small utilities shared by the dispatch path,
//! the worker pool and the clock service.

pub mod ids;
pub mod registry;

pub use ids::gen_unique_id;
pub use registry::TaskRegistry;
