//! Utilities for memory-efficient data structures.
//!
//! This module provides low-level utilities used internally by the crate.
//! In particular, it exposes a [`Slab`] arena used both for wait queue
//! nodes and for task storage in the runtime.

mod slab;

pub(crate) use slab::Slab;
