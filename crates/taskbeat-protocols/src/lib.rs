//! # taskbeat Protocols
//!
//! Capability traits shared by the scheduling core.
//! Contains interface definitions and the plain data types that cross them.
//!
//! ## Core Traits
//!
//! - [`Job`] - A registered unit of work, optionally periodic
//! - [`JobRegistry`] - Name based job lookup
//! - [`Publisher`] / [`Connector`] - Message submission towards workers
//! - [`TaskSubmitter`] - The asynchronous submission capability used by the scheduler
//! - [`ResultHandle`] - Readiness and result of an in-flight job

pub mod error;
pub mod job;
pub mod options;
pub mod publisher;
pub mod registry;
pub mod result;
pub mod submit;

pub use error::{DispatchError, JobError, PublishError, RegistryError, ResultError};
pub use job::{Job, TaskArgs, TaskKwargs};
pub use options::ExecOptions;
pub use publisher::{Connector, Publisher, TaskMessage};
pub use registry::JobRegistry;
pub use result::{AsyncResult, EagerResult, RemoteResult, ResultHandle, TaskState};
pub use submit::{ApplyRequest, TaskSubmitter};
