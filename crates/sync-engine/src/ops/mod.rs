// crates/sync-engine/src/ops/mod.rs
//! Operations that run on the bookmark worker
//!
//! Each operation takes the [`WorkerContext`](crate::worker::WorkerContext),
//! so none of them can be called from any other thread.

pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod load;
pub(crate) mod settings;
pub(crate) mod sync;
