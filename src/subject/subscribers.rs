use std::sync::Arc;

use smallvec::SmallVec;

use crate::{subscriber::Completion, subscription::Outlet};

/// The active subscriptions of a subject, keyed by the id handed to their
/// handles.
///
/// Uses `SmallVec<[_; 2]>` to avoid heap allocation for the common case of
/// one or two subscribers.
pub(crate) struct Subscribers<T, E> {
  next_id: usize,
  items: SmallVec<[(usize, Arc<Outlet<T, E>>); 2]>,
}

impl<T, E> Default for Subscribers<T, E> {
  fn default() -> Self { Self { next_id: 0, items: SmallVec::new() } }
}

impl<T, E> Subscribers<T, E> {
  /// Add an outlet and return its unique ID.
  pub(crate) fn add(&mut self, outlet: Arc<Outlet<T, E>>) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.items.push((id, outlet));
    id
  }

  /// Remove an outlet by ID. The caller drops it once no lock is held.
  pub(crate) fn remove(&mut self, id: usize) -> Option<Arc<Outlet<T, E>>> {
    self
      .items
      .iter()
      .position(|(i, _)| *i == id)
      .map(|pos| self.items.remove(pos).1)
  }

  /// Forget outlets that were cancelled but not yet removed.
  pub(crate) fn prune(&mut self) { self.items.retain(|(_, outlet)| !outlet.is_closed()); }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.items.len() }

  /// Queue `value` on every outlet and return the outlets to drain once the
  /// subject lock is released.
  ///
  /// Every outlet but the last receives a clone; the last one receives the
  /// moved value.
  pub(crate) fn broadcast_value(&mut self, value: T) -> SmallVec<[Arc<Outlet<T, E>>; 2]>
  where
    T: Clone,
  {
    let mut iter = self.items.iter().peekable();
    while let Some((_, outlet)) = iter.next() {
      if iter.peek().is_some() {
        outlet.push(value.clone());
      } else {
        outlet.push(value);
        break;
      }
    }
    self.items.iter().map(|(_, outlet)| outlet.clone()).collect()
  }

  /// Queue the terminal event on every outlet and clear the list, returning
  /// the drained outlets.
  pub(crate) fn broadcast_completion(
    &mut self,
    completion: Completion<E>,
  ) -> SmallVec<[Arc<Outlet<T, E>>; 2]>
  where
    E: Clone,
  {
    let drained: SmallVec<[_; 2]> = self.items.drain(..).map(|(_, outlet)| outlet).collect();
    for outlet in &drained {
      outlet.push_completion(completion.clone());
    }
    drained
  }
}
