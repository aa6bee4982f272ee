//! # taskbeat Beat
//!
//! The clock service. A [`Scheduler`] keeps one [`ScheduleEntry`] per
//! periodic job in a persisted [`ScheduleStore`] and submits the due ones
//! on every tick; a [`ClockService`] drives the scheduler until asked to
//! stop.

pub mod clock;
pub mod entry;
pub mod error;
pub mod scheduler;
pub mod store;

#[cfg(test)]
mod testing;

pub use clock::{ClockService, ClockServiceTask, ClockState};
pub use entry::ScheduleEntry;
pub use error::{BeatError, SchedulingError, StoreError};
pub use scheduler::{DEFAULT_INTERVAL, Scheduler, TickResult};
pub use store::{FileScheduleStore, FileStoreOpener, MemoryScheduleStore, ScheduleStore, StoreOpener};
