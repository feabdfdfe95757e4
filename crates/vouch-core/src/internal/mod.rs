//! Internal scheduling for the introduction service.
//!
//! - [`IntroduceeLocks`]: one FIFO lock per introducee, so mutations for
//!   the same contact apply in arrival order
//! - [`WorkerPool`]: bounded set of tasks running mutations
//!
//! Unrelated introducees never wait on each other's locks; they only share
//! the pool's permits.

pub mod introducee_locks;
pub mod worker_pool;

pub use introducee_locks::IntroduceeLocks;
pub use worker_pool::WorkerPool;
