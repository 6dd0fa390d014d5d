//! Cooperative task primitives.
//!
//! This module defines how the runtime represents, schedules, and
//! identifies tasks.
//!
//! It includes:
//! - task state management,
//! - custom waker integration,
//! - join handles for awaiting or aborting tasks,
//! - [`TaskId`], the non-owning handle the synchronization primitives queue.
//!
//! Most users will interact with this module through [`spawn`] and
//! [`JoinHandle`], while the lower-level components are used internally
//! by the executor.

pub(crate) mod handle;
pub(crate) mod id;
pub(crate) mod state;
pub(crate) mod waker;

pub(crate) use self::core::{Header, Task, TaskFuture};
pub(crate) use handle::JoinState;

pub mod core;

pub use self::core::{current, spawn};
pub use handle::JoinHandle;
pub use id::TaskId;
