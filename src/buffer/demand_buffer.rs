use std::collections::VecDeque;

use smallvec::SmallVec;

use crate::demand::Demand;

/// Values a [`DemandBuffer`] released for delivery, oldest first.
pub type Flushed<T> = SmallVec<[T; 1]>;

/// Pending values plus the outstanding demand of one subscriber.
///
/// The buffer turns "a value arrived" and "the subscriber asked for more" into
/// the values that may be delivered right now. It never hands out more values
/// than were requested and never calls the subscriber itself: the owner
/// delivers the returned values and feeds whatever demand the subscriber
/// returns back into [`DemandBuffer::request`].
///
/// ```rust
/// use rxreplay::{buffer::DemandBuffer, Demand};
///
/// let mut buffer = DemandBuffer::default();
/// assert!(buffer.append(1).is_empty());
/// assert!(buffer.append(2).is_empty());
/// assert_eq!(buffer.request(Demand::max(1)).as_slice(), &[1]);
/// assert_eq!(buffer.request(Demand::unlimited()).as_slice(), &[2]);
/// assert_eq!(buffer.append(3).as_slice(), &[3]);
/// ```
pub struct DemandBuffer<T> {
  queue: VecDeque<T>,
  demand: Demand,
}

impl<T> Default for DemandBuffer<T> {
  fn default() -> Self { Self { queue: VecDeque::new(), demand: Demand::none() } }
}

impl<T> DemandBuffer<T> {
  /// A buffer that starts out holding `values`, with no demand yet.
  pub fn with_values(values: impl IntoIterator<Item = T>) -> Self {
    Self { queue: values.into_iter().collect(), demand: Demand::none() }
  }

  /// Records `value` and returns whatever can be delivered immediately.
  pub fn append(&mut self, value: T) -> Flushed<T> {
    if self.demand.is_unlimited() {
      debug_assert!(self.queue.is_empty());
      let mut ready = Flushed::new();
      ready.push(value);
      return ready;
    }
    self.queue.push_back(value);
    self.flush()
  }

  /// Adds `additional` demand and returns the queued values it releases.
  pub fn request(&mut self, additional: Demand) -> Flushed<T> {
    if additional.is_none() {
      return Flushed::new();
    }
    self.demand = self.demand + additional;
    self.flush()
  }

  /// Demand left after everything releasable has been released.
  #[inline]
  pub fn demand(&self) -> Demand { self.demand }

  #[inline]
  pub fn len(&self) -> usize { self.queue.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.queue.is_empty() }

  /// Drops every queued value. Outstanding demand is kept.
  pub fn clear(&mut self) { self.queue.clear(); }

  fn flush(&mut self) -> Flushed<T> {
    let mut ready = Flushed::new();
    while !self.demand.is_none() {
      let Some(value) = self.queue.pop_front() else { break };
      self.demand.consume_one();
      ready.push(value);
    }
    ready
  }
}
