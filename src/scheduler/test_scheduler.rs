//! A manually driven scheduler for deterministic tests.
//!
//! Spawned tasks are only queued. The test decides when they make progress
//! by calling [`TestScheduler::run_until_stalled`], which makes it possible to
//! observe the states in between, e.g. a bridge whose operation is running but
//! has not produced anything yet.
//!
//! ```rust
//! use futures::FutureExt;
//! use rxreplay::scheduler::{Scheduler, TestScheduler};
//!
//! let scheduler = TestScheduler::default();
//! scheduler.spawn(async {}.boxed());
//! assert_eq!(scheduler.pending(), 1);
//! assert_eq!(scheduler.run_until_stalled(), 0);
//! ```

use std::{
  mem,
  sync::{Arc, Mutex},
  task::{Context, Poll},
};

use futures::{future::BoxFuture, task::noop_waker_ref, FutureExt};

use super::Scheduler;
use crate::rc::RcDerefMut;

/// Queues tasks until the test runs them. Clones share one queue.
#[derive(Clone, Default)]
pub struct TestScheduler {
  tasks: Arc<Mutex<Vec<BoxFuture<'static, ()>>>>,
}

impl TestScheduler {
  /// Number of tasks spawned and not yet finished.
  pub fn pending(&self) -> usize { self.tasks.rc_deref_mut().len() }

  /// Polls every queued task, again and again, until a full pass finishes
  /// none of them. Returns how many are still pending.
  ///
  /// Tasks are polled with the queue unlocked, so they may spawn more tasks.
  pub fn run_until_stalled(&self) -> usize {
    let mut cx = Context::from_waker(noop_waker_ref());
    loop {
      let batch = mem::take(&mut *self.tasks.rc_deref_mut());
      if batch.is_empty() {
        return 0;
      }
      let before = batch.len();
      let still_pending: Vec<_> = batch
        .into_iter()
        .filter_map(|mut task| match task.poll_unpin(&mut cx) {
          Poll::Ready(()) => None,
          Poll::Pending => Some(task),
        })
        .collect();
      let progressed = still_pending.len() < before;

      let mut tasks = self.tasks.rc_deref_mut();
      let spawned = !tasks.is_empty();
      let mut merged = still_pending;
      merged.append(&mut *tasks);
      *tasks = merged;
      if !progressed && !spawned {
        return tasks.len();
      }
    }
  }
}

impl Scheduler for TestScheduler {
  fn spawn(&self, task: BoxFuture<'static, ()>) { self.tasks.rc_deref_mut().push(task); }
}
