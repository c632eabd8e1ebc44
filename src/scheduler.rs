//! Executors the operation bridge spawns its single task on.

use std::sync::Arc;

use futures::future::{AbortHandle, BoxFuture};

mod test_scheduler;

pub use test_scheduler::TestScheduler;

/// An executor that runs a task to completion in the background.
pub trait Scheduler: Send + Sync {
  fn spawn(&self, task: BoxFuture<'static, ()>);
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
  #[inline]
  fn spawn(&self, task: BoxFuture<'static, ()>) { (**self).spawn(task) }
}

#[cfg(feature = "futures-scheduler")]
impl Scheduler for futures::executor::ThreadPool {
  #[inline]
  fn spawn(&self, task: BoxFuture<'static, ()>) { self.spawn_ok(task) }
}

#[cfg(feature = "tokio-scheduler")]
impl Scheduler for tokio::runtime::Handle {
  #[inline]
  fn spawn(&self, task: BoxFuture<'static, ()>) {
    let _detached = tokio::runtime::Handle::spawn(self, task);
  }
}

/// The process-wide pool used when no scheduler is given.
#[cfg(feature = "futures-scheduler")]
pub fn default_scheduler() -> Arc<dyn Scheduler> {
  use futures::executor::ThreadPool;
  use once_cell::sync::Lazy;

  static DEFAULT_POOL: Lazy<ThreadPool> = Lazy::new(|| {
    ThreadPool::builder()
      .name_prefix("rxreplay-")
      .create()
      .expect("failed to start the default thread pool")
  });

  Arc::new(DEFAULT_POOL.clone())
}

/// Cancellation handle of a spawned task.
///
/// Aborting is cooperative: the task stops at its next suspension point, and
/// whatever it would have produced afterwards is never observed.
#[derive(Clone, Debug)]
pub struct TaskHandle(AbortHandle);

impl TaskHandle {
  pub(crate) fn new(handle: AbortHandle) -> Self { TaskHandle(handle) }

  /// Requests the task to stop. Idempotent.
  #[inline]
  pub fn abort(&self) { self.0.abort() }

  #[inline]
  pub fn is_aborted(&self) -> bool { self.0.is_aborted() }
}
