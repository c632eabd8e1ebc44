use std::sync::Arc;

use super::replay_subject::SubjectState;
use crate::{
  demand::Demand,
  rc::{RcDerefMut, WeakMutArc},
  subscription::{Outlet, Subscription},
};

/// Subscription handle for a [`ReplaySubject`](super::ReplaySubject).
///
/// The subject owns the shared delivery state while the subscription is
/// active; the handle only keeps a weak reference back to the subject, used
/// to deregister itself on cancellation. Dropping the handle does not cancel;
/// use [`Subscription::unsubscribe_when_dropped`] for that.
pub struct ReplaySubscription<T, E> {
  outlet: Arc<Outlet<T, E>>,
  subject: WeakMutArc<SubjectState<T, E>>,
  id: Option<usize>,
}

impl<T, E> ReplaySubscription<T, E> {
  pub(crate) fn new(
    outlet: Arc<Outlet<T, E>>,
    subject: WeakMutArc<SubjectState<T, E>>,
    id: Option<usize>,
  ) -> Self {
    Self { outlet, subject, id }
  }
}

impl<T, E> Subscription for ReplaySubscription<T, E> {
  #[inline]
  fn request(&self, demand: Demand) { self.outlet.request(demand) }

  fn cancel(&self) {
    if !self.outlet.cancel() {
      return;
    }
    // The subject lock is never held while a subscriber runs, so detaching
    // here is safe even from inside a callback.
    let (Some(id), Some(subject)) = (self.id, self.subject.upgrade()) else { return };
    let removed = subject.rc_deref_mut().subscribers.remove(id);
    drop(removed);
  }

  #[inline]
  fn is_closed(&self) -> bool { self.outlet.is_closed() }
}
