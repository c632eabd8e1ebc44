//! Bridges one asynchronous operation into the subscription protocol.

use std::{
  future::Future,
  mem,
  sync::{Arc, Mutex},
};

use futures::{
  future::{AbortHandle, Abortable, BoxFuture},
  FutureExt,
};
use tracing::{debug, trace};

#[cfg(feature = "futures-scheduler")]
use crate::scheduler::default_scheduler;
use crate::{
  demand::Demand,
  publisher::Publisher,
  rc::RcDerefMut,
  scheduler::{Scheduler, TaskHandle},
  subject::{ReplaySubject, ReplaySubscription},
  subscriber::Subscriber,
  subscription::Subscription,
};

type Operation<T, E> = Box<dyn FnOnce() -> BoxFuture<'static, Result<T, E>> + Send>;

/// Lifecycle of the wrapped operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationState {
  /// Nobody has requested a value yet.
  NotStarted,
  /// The operation has been spawned and has not finished yet.
  Running,
  /// The operation produced its value.
  Delivered,
  /// The operation failed.
  Failed,
  /// Every subscription cancelled before the operation finished.
  Cancelled,
}

enum Launch<T, E> {
  NotStarted(Operation<T, E>),
  Running(TaskHandle),
  Delivered,
  Failed,
  Cancelled,
}

/// A stream of exactly one asynchronous operation.
///
/// The operation is started lazily, the first time any subscription requests
/// a value, and runs at most once no matter how many subscriptions race to
/// start it. Its value, followed by a success completion, or its failure is
/// published to every subscription, including ones that subscribe after it
/// finished. When the last active subscription cancels while the operation is
/// still running, the task is aborted and whatever it produces afterwards is
/// dropped.
///
/// ```rust
/// use rxreplay::prelude::*;
/// use std::sync::mpsc;
///
/// let stream = OperationStream::<i32, ()>::new(|| async { Ok(42) });
/// let (tx, rx) = mpsc::channel();
/// let c_tx = tx.clone();
/// let _subscription = stream.sink(
///   move |v| c_tx.send(Ok(v)).unwrap(),
///   move |completion| tx.send(Err(completion)).unwrap(),
/// );
/// assert_eq!(rx.recv().unwrap(), Ok(42));
/// assert_eq!(rx.recv().unwrap(), Err(Ok(())));
/// ```
pub struct OperationStream<T, E> {
  bridge: Arc<Bridge<T, E>>,
}

struct Bridge<T, E> {
  subject: ReplaySubject<T, E>,
  launch: Mutex<Launch<T, E>>,
  scheduler: Arc<dyn Scheduler>,
}

impl<T, E> Clone for OperationStream<T, E> {
  fn clone(&self) -> Self { OperationStream { bridge: self.bridge.clone() } }
}

impl<T, E> OperationStream<T, E>
where
  T: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  /// Wraps `operation`, to be run on the shared default thread pool.
  #[cfg(feature = "futures-scheduler")]
  pub fn new<F, Fut>(operation: F) -> Self
  where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
  {
    Self::with_scheduler(operation, default_scheduler())
  }

  /// Wraps `operation`, to be run on `scheduler`.
  pub fn with_scheduler<F, Fut, S>(operation: F, scheduler: S) -> Self
  where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    S: Scheduler + 'static,
  {
    let operation: Operation<T, E> = Box::new(move || operation().boxed());
    OperationStream {
      bridge: Arc::new(Bridge {
        subject: ReplaySubject::new(1),
        launch: Mutex::new(Launch::NotStarted(operation)),
        scheduler: Arc::new(scheduler),
      }),
    }
  }

  /// Where the operation is in its lifecycle.
  pub fn state(&self) -> OperationState {
    match &*self.bridge.launch.rc_deref_mut() {
      Launch::NotStarted(_) => OperationState::NotStarted,
      Launch::Running(_) => OperationState::Running,
      Launch::Delivered => OperationState::Delivered,
      Launch::Failed => OperationState::Failed,
      Launch::Cancelled => OperationState::Cancelled,
    }
  }
}

impl<T, E> Bridge<T, E>
where
  T: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  fn start(self: &Arc<Self>) {
    let (abort, registration) = AbortHandle::new_pair();
    let operation = {
      let mut launch = self.launch.rc_deref_mut();
      // A cancel racing this request may have left nobody to deliver to.
      if self.subject.subscriber_count() == 0 {
        trace!("no subscriber left, operation not launched");
        return;
      }
      match mem::replace(&mut *launch, Launch::Cancelled) {
        Launch::NotStarted(operation) => {
          *launch = Launch::Running(TaskHandle::new(abort));
          operation
        }
        other => {
          *launch = other;
          trace!("operation already launched");
          return;
        }
      }
    };
    debug!("operation started");

    let bridge = self.clone();
    let task = Abortable::new(operation(), registration).map(move |output| {
      if let Ok(output) = output {
        bridge.finish(output);
      }
    });
    self.scheduler.spawn(task.boxed());
  }

  fn finish(&self, output: Result<T, E>) {
    {
      let mut launch = self.launch.rc_deref_mut();
      if !matches!(*launch, Launch::Running(_)) {
        debug!("output of a cancelled operation dropped");
        return;
      }
      *launch = if output.is_ok() { Launch::Delivered } else { Launch::Failed };
    }
    match output {
      Ok(value) => {
        self.subject.send(value);
        self.subject.send_completion(Ok(()));
      }
      Err(err) => self.subject.send_completion(Err(err)),
    }
  }

  /// Aborts the running operation once no subscription is left to receive
  /// its output.
  fn release(&self) {
    let previous = {
      let mut launch = self.launch.rc_deref_mut();
      if !matches!(*launch, Launch::Running(_)) || self.subject.subscriber_count() > 0 {
        return;
      }
      mem::replace(&mut *launch, Launch::Cancelled)
    };
    if let Launch::Running(task) = previous {
      debug!("operation cancelled");
      task.abort();
    }
  }
}

impl<T, E> Publisher<T, E> for OperationStream<T, E>
where
  T: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  type Subscription = OperationSubscription<T, E>;

  /// Registers `subscriber` without starting the operation.
  ///
  /// A bridge whose operation was cancelled never produces anything, so the
  /// subscription is returned already closed.
  fn subscribe<S>(&self, subscriber: S) -> OperationSubscription<T, E>
  where
    S: Subscriber<T, E> + 'static,
  {
    let inner = self.bridge.subject.subscribe(subscriber);
    // Registered before the check: a concurrent `release` either counts this
    // subscription or has already marked the bridge cancelled.
    let cancelled = matches!(*self.bridge.launch.rc_deref_mut(), Launch::Cancelled);
    if cancelled {
      inner.cancel();
    }
    OperationSubscription { inner, bridge: self.bridge.clone() }
  }
}

/// Subscription handle for an [`OperationStream`].
///
/// Unlike a subject subscription, it keeps the bridge alive: the operation
/// can still be started through it after every `OperationStream` handle is
/// gone.
pub struct OperationSubscription<T, E> {
  inner: ReplaySubscription<T, E>,
  bridge: Arc<Bridge<T, E>>,
}

impl<T, E> Subscription for OperationSubscription<T, E>
where
  T: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  fn request(&self, demand: Demand) {
    self.inner.request(demand);
    if !demand.is_none() && !self.inner.is_closed() {
      self.bridge.start();
    }
  }

  fn cancel(&self) {
    self.inner.cancel();
    self.bridge.release();
  }

  #[inline]
  fn is_closed(&self) -> bool { self.inner.is_closed() }
}
