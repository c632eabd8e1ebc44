use std::sync::Arc;

use smallvec::SmallVec;
use tracing::{debug, trace};

use super::{subject_subscription::ReplaySubscription, subscribers::Subscribers};
use crate::{
  buffer::HistoryBuffer,
  publisher::Publisher,
  rc::{MutArc, RcDerefMut},
  subscriber::{Completion, Subscriber},
  subscription::Outlet,
};

/// A multicast subject that replays its most recent values to every new
/// subscription.
///
/// Each subscription paces itself through its own demand: a slow subscriber
/// neither blocks nor loses values for a fast one. Per subscription, delivery
/// order is always the replayed history, then live values in send order, then
/// the terminal event.
///
/// Cloning a `ReplaySubject` yields another handle to the same subject.
///
/// ```rust
/// use rxreplay::prelude::*;
/// use std::sync::{Arc, Mutex};
///
/// let subject = ReplaySubject::<&str, ()>::new(2);
/// subject.send("a");
/// subject.send("b");
/// subject.send("c");
///
/// let seen = Arc::new(Mutex::new(vec![]));
/// let c_seen = seen.clone();
/// let subscription = subject.subscribe(Sink::new(
///   move |v| c_seen.lock().unwrap().push(v),
///   |_| {},
/// ));
/// subscription.request(Demand::max(2));
/// assert_eq!(*seen.lock().unwrap(), vec!["b", "c"]);
/// ```
pub struct ReplaySubject<T, E> {
  pub(crate) state: MutArc<SubjectState<T, E>>,
}

pub(crate) struct SubjectState<T, E> {
  history: HistoryBuffer<T>,
  pub(crate) subscribers: Subscribers<T, E>,
  terminal: Option<Completion<E>>,
}

impl<T, E> Clone for ReplaySubject<T, E> {
  fn clone(&self) -> Self { ReplaySubject { state: self.state.clone() } }
}

impl<T, E> ReplaySubject<T, E> {
  /// A subject replaying up to `capacity` values. A capacity of zero turns
  /// replay off.
  pub fn new(capacity: usize) -> Self {
    ReplaySubject {
      state: MutArc::own(SubjectState {
        history: HistoryBuffer::new(capacity),
        subscribers: Subscribers::default(),
        terminal: None,
      }),
    }
  }

  /// Number of subscriptions still registered.
  pub fn subscriber_count(&self) -> usize {
    let mut state = self.state.rc_deref_mut();
    state.subscribers.prune();
    state.subscribers.len()
  }

  /// Whether a terminal event has been recorded.
  pub fn is_terminated(&self) -> bool { self.state.rc_deref_mut().terminal.is_some() }
}

impl<T, E> ReplaySubject<T, E>
where
  T: Clone,
{
  /// Values a new subscription would replay, oldest first.
  pub fn history(&self) -> Vec<T> { self.state.rc_deref_mut().history.snapshot() }

  /// Records `value` and delivers it to every active subscription as demand
  /// allows. Ignored once a terminal event has been recorded.
  pub fn send(&self, value: T) {
    let outlets = {
      let mut state = self.state.rc_deref_mut();
      if state.terminal.is_some() {
        trace!("value sent after terminal event ignored");
        return;
      }
      if state.history.capacity() > 0 {
        state.history.append(value.clone());
      }
      state.subscribers.prune();
      state.subscribers.broadcast_value(value)
    };
    drain_all(outlets);
  }
}

impl<T, E> ReplaySubject<T, E>
where
  E: Clone,
{
  /// Records the terminal event and delivers it to every active subscription
  /// behind the values already queued for it.
  ///
  /// Only the first terminal event counts; later ones are ignored, so racing
  /// producers may all try to finish the subject.
  pub fn send_completion(&self, completion: Completion<E>) {
    let outlets = {
      let mut state = self.state.rc_deref_mut();
      if state.terminal.is_some() {
        trace!("duplicate terminal event ignored");
        return;
      }
      debug!(failed = completion.is_err(), subscribers = state.subscribers.len(), "subject terminated");
      state.terminal = Some(completion.clone());
      state.subscribers.broadcast_completion(completion)
    };
    drain_all(outlets);
  }
}

impl<T, E> Publisher<T, E> for ReplaySubject<T, E>
where
  T: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  type Subscription = ReplaySubscription<T, E>;

  /// Registers `subscriber`, queueing the current history for it.
  ///
  /// If the subject already terminated, the subscription is born inactive and
  /// its terminal event follows the replayed values, immediately when there
  /// are none.
  fn subscribe<S>(&self, subscriber: S) -> ReplaySubscription<T, E>
  where
    S: Subscriber<T, E> + 'static,
  {
    let (outlet, id) = {
      let mut state = self.state.rc_deref_mut();
      let outlet = Arc::new(Outlet::new(Box::new(subscriber), state.history.snapshot()));
      let id = match &state.terminal {
        Some(terminal) => {
          outlet.push_completion(terminal.clone());
          None
        }
        None => Some(state.subscribers.add(outlet.clone())),
      };
      trace!(replayed = state.history.len(), active = id.is_some(), "subscribed");
      (outlet, id)
    };
    outlet.drain();
    ReplaySubscription::new(outlet, self.state.downgrade(), id)
  }
}

fn drain_all<T, E>(outlets: SmallVec<[Arc<Outlet<T, E>>; 2]>) {
  for outlet in outlets {
    outlet.drain();
  }
}
