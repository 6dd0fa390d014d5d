//! Task executor implementation.
//!
//! It is composed of:
//! - [`core`]: the executor, owning tasks and the critical flag,
//! - `ready`: the FIFO queue of tasks waiting to be polled.
//!
//! Everything here runs on the thread that called `block_on`.

pub(crate) mod core;
mod ready;

pub(crate) use self::core::Executor;
pub(crate) use ready::ReadyQueue;
