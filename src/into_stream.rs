//! IntoStream
//!
//! Pulls a [`Publisher`] through a [`futures::Stream`], so its values can be
//! consumed with `while let` loops and the rest of the async ecosystem.
//! Demand follows the consumer: one value is requested whenever the stream is
//! polled with nothing buffered.
//!
//! # Example
//!
//! ```rust
//! use futures::{executor::block_on, StreamExt};
//! use rxreplay::prelude::*;
//!
//! let subject = ReplaySubject::<i32, ()>::new(3);
//! subject.send(1);
//! subject.send(2);
//! subject.send_completion(Ok(()));
//!
//! let values: Vec<_> = block_on(subject.into_stream().collect());
//! assert_eq!(values, vec![Ok(1), Ok(2)]);
//! ```

use std::{
  collections::VecDeque,
  pin::Pin,
  sync::{Arc, Mutex},
  task::{Context, Poll, Waker},
};

use futures::Stream;

use crate::{
  demand::Demand,
  publisher::Publisher,
  rc::RcDerefMut,
  subscriber::{Completion, Subscriber},
  subscription::Subscription,
};

struct IntoStreamState<T, E> {
  queue: VecDeque<Result<T, E>>,
  waker: Option<Waker>,
  requested: bool,
  is_closed: bool,
}

/// A `Stream` of `Ok(value)` for each value, then `Err(e)` if the publisher
/// fails. It ends after the terminal event and cancels its subscription when
/// dropped.
pub struct IntoStream<T, E, S: Subscription> {
  state: Arc<Mutex<IntoStreamState<T, E>>>,
  subscription: S,
}

impl<T, E, S> IntoStream<T, E, S>
where
  T: Send + 'static,
  E: Send + 'static,
  S: Subscription,
{
  pub fn new<P>(publisher: &P) -> Self
  where
    P: Publisher<T, E, Subscription = S>,
  {
    let state = Arc::new(Mutex::new(IntoStreamState {
      queue: VecDeque::new(),
      waker: None,
      requested: false,
      is_closed: false,
    }));
    let subscription = publisher.subscribe(IntoStreamSubscriber { state: state.clone() });
    IntoStream { state, subscription }
  }
}

impl<T, E, S: Subscription + Unpin> Stream for IntoStream<T, E, S> {
  type Item = Result<T, E>;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    let this = self.get_mut();
    {
      let mut state = this.state.rc_deref_mut();
      if let Some(item) = state.queue.pop_front() {
        return Poll::Ready(Some(item));
      }
      // A subscription can also be closed without a terminal event, e.g. one
      // born cancelled.
      if state.is_closed || this.subscription.is_closed() {
        return Poll::Ready(None);
      }
      state.waker = Some(cx.waker().clone());
      if state.requested {
        return Poll::Pending;
      }
      state.requested = true;
    }

    // The publisher may deliver synchronously, so the state lock must be
    // released before asking.
    this.subscription.request(Demand::max(1));
    let mut state = this.state.rc_deref_mut();
    match state.queue.pop_front() {
      Some(item) => Poll::Ready(Some(item)),
      None if state.is_closed || this.subscription.is_closed() => Poll::Ready(None),
      None => Poll::Pending,
    }
  }
}

impl<T, E, S: Subscription> Drop for IntoStream<T, E, S> {
  fn drop(&mut self) { self.subscription.cancel(); }
}

struct IntoStreamSubscriber<T, E> {
  state: Arc<Mutex<IntoStreamState<T, E>>>,
}

impl<T, E> IntoStreamSubscriber<T, E> {
  fn push(&self, item: Option<Result<T, E>>, close: bool) {
    let waker = {
      let mut state = self.state.rc_deref_mut();
      state.queue.extend(item);
      state.requested = false;
      state.is_closed |= close;
      state.waker.take()
    };
    if let Some(waker) = waker {
      waker.wake();
    }
  }
}

impl<T: Send, E: Send> Subscriber<T, E> for IntoStreamSubscriber<T, E> {
  fn receive(&mut self, value: T) -> Demand {
    self.push(Some(Ok(value)), false);
    Demand::none()
  }

  fn receive_completion(&mut self, completion: Completion<E>) {
    self.push(completion.err().map(Err), true);
  }
}
