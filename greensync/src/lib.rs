//! # greensync
//!
//! **greensync** provides synchronization primitives for cooperatively
//! scheduled tasks, together with the small single-threaded runtime they
//! run on.
//!
//! Exactly one task runs at a time and control changes hands only at
//! `.await` points. The primitives therefore need no hardware atomics:
//! multi-step updates are made atomic by raising the scheduler's critical
//! (non-preemption) flag for their duration.
//!
//! - [`Mutex`]: a non-reentrant lock handed to waiters in FIFO order,
//!   with self-deadlock detection
//! - [`ConditionVariable`]: parks tasks until signalled, releasing a
//!   [`Mutex`] around the wait
//! - [`Queue`]: an unbounded FIFO whose consumers block while it is empty
//! - [`sync::exclusive`]: runs a closure with preemption disabled
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use greensync::{Mutex, task};
//! use std::rc::Rc;
//!
//! #[greensync::main]
//! async fn main() {
//!     let mutex = Rc::new(Mutex::new());
//!
//!     let worker = task::spawn({
//!         let mutex = mutex.clone();
//!         async move {
//!             mutex.synchronize(|| async { println!("in critical region") }).await
//!         }
//!     });
//!
//!     worker.await.unwrap();
//! }
//! ```
//!
//! ## Modules
//!
//! - [`sync`]: the primitives and the [`Scheduler`](sync::Scheduler) trait
//!   they are written against
//! - [`task`]: spawning and identifying tasks

mod error;
mod runtime;
mod utils;

pub mod sync;

pub use error::{LockError, RuntimeError, TaskDead};
pub use runtime::Current;
pub use runtime::Runtime;
pub use runtime::builder::RuntimeBuilder;
pub use runtime::task;
pub use runtime::yield_now::yield_now;
pub use sync::{ConditionVariable, Mutex, Queue};

pub use greensync_macros::{main, test};
