//! # taskbeat Workqueue
//!
//! Local execution side of taskbeat.
//!
//! ## Features
//!
//! - Worker pool with bounded concurrency, returning result handles
//! - Bounded result queue that drains itself when full
//! - Fixed-slot tracker for results that arrive out of order
//! - In-process connector so the dispatch path can publish to the pool

pub mod config;
pub mod error;
pub mod pool;
pub mod position;
pub mod process_queue;
pub mod publisher;
pub mod worker;

pub use config::QueueConfig;
pub use error::QueueError;
pub use pool::{PoolResult, WorkerPool};
pub use position::{PositionQueue, Slot};
pub use process_queue::TaskProcessQueue;
pub use publisher::{PoolConnector, PoolPublisher};
pub use worker::LocalWorker;
