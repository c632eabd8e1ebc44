use std::collections::VecDeque;

/// The most recent `capacity` values, oldest first.
///
/// A capacity of zero retains nothing, which is how a subject turns replay
/// off.
pub struct HistoryBuffer<T> {
  values: VecDeque<T>,
  capacity: usize,
}

impl<T> HistoryBuffer<T> {
  pub fn new(capacity: usize) -> Self { Self { values: VecDeque::with_capacity(capacity), capacity } }

  /// Records `value`, evicting the oldest retained value when full.
  pub fn append(&mut self, value: T) {
    if self.capacity == 0 {
      return;
    }
    if self.values.len() == self.capacity {
      self.values.pop_front();
    }
    self.values.push_back(value);
  }

  #[inline]
  pub fn capacity(&self) -> usize { self.capacity }

  #[inline]
  pub fn len(&self) -> usize { self.values.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.values.is_empty() }

  /// Retained values, oldest first, without cloning.
  pub fn iter(&self) -> impl Iterator<Item = &T> + '_ { self.values.iter() }
}

impl<T: Clone> HistoryBuffer<T> {
  /// Retained values, oldest first.
  pub fn snapshot(&self) -> Vec<T> { self.iter().cloned().collect() }
}
