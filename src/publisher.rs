//! The producing side of the subscription protocol.

use crate::{
  demand::Demand,
  into_stream::IntoStream,
  subscriber::{Completion, Sink, Subscriber},
  subscription::Subscription,
};

/// Something a [`Subscriber`] can subscribe to.
///
/// Subscribing never delivers a value by itself: values flow once the
/// returned subscription is given demand. A terminal event that is already
/// known may be delivered straight away, since it needs no demand.
pub trait Publisher<T, E> {
  type Subscription: Subscription;

  fn subscribe<S>(&self, subscriber: S) -> Self::Subscription
  where
    S: Subscriber<T, E> + 'static;

  /// Subscribes with closures and requests unlimited demand.
  ///
  /// ```rust
  /// use rxreplay::prelude::*;
  /// use std::sync::{Arc, Mutex};
  ///
  /// let subject = ReplaySubject::<i32, ()>::new(1);
  /// subject.send(1);
  ///
  /// let seen = Arc::new(Mutex::new(vec![]));
  /// let c_seen = seen.clone();
  /// let _subscription = subject.sink(move |v| c_seen.lock().unwrap().push(v), |_| {});
  /// subject.send(2);
  /// assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
  /// ```
  fn sink<N, C>(&self, on_value: N, on_completion: C) -> Self::Subscription
  where
    N: FnMut(T) + Send + 'static,
    C: FnOnce(Completion<E>) + Send + 'static,
  {
    let subscription = self.subscribe(Sink::new(on_value, on_completion));
    subscription.request(Demand::unlimited());
    subscription
  }

  /// Pulls this publisher through a [`futures::Stream`], one value per poll.
  fn into_stream(&self) -> IntoStream<T, E, Self::Subscription>
  where
    Self: Sized,
    T: Send + 'static,
    E: Send + 'static,
  {
    IntoStream::new(self)
  }
}
