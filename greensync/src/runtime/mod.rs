//! Core runtime components.
//!
//! This module contains the single-threaded cooperative runtime the
//! synchronization primitives run on: tasks, the executor, the
//! thread-local runtime context, and the [`Current`] scheduler handle.
//!
//! Most users will interact with [`Runtime`] through
//! [`RuntimeBuilder`](crate::RuntimeBuilder) or the `#[greensync::main]`
//! and `#[greensync::test]` attributes.

mod core;
mod executor;
mod scheduler;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod yield_now;

pub mod task;

pub use self::core::Runtime;
pub use scheduler::Current;
