//! # taskbeat Execute
//!
//! The dispatch path. A [`Dispatcher`] either runs a job inline
//! ("eager") through a [`TaskTrace`] or hands a task message to a
//! publisher and returns a handle bound to the published id.

mod context;
mod dispatch;
mod trace;

pub use context::{EagerContext, CONTEXT_KEYS};
pub use dispatch::{Dispatcher, DispatcherConfig};
pub use trace::TaskTrace;
