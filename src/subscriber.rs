//! The consuming end of a stream.

use crate::demand::Demand;

/// Terminal event of a stream: `Ok(())` on success, `Err(e)` on failure.
pub type Completion<E> = Result<(), E>;

/// A consumer of values under explicit demand.
///
/// A subscriber never receives more values than it asked for through
/// [`Subscription::request`](crate::subscription::Subscription::request) plus
/// the demand it returned from [`receive`](Subscriber::receive). The terminal
/// event needs no demand and arrives at most once, after every value.
pub trait Subscriber<T, E>: Send {
  /// Receives one value and returns how much *additional* demand to grant.
  fn receive(&mut self, value: T) -> Demand;

  /// Receives the terminal event. Nothing is delivered afterwards.
  fn receive_completion(&mut self, completion: Completion<E>);
}

pub(crate) type BoxedSubscriber<T, E> = Box<dyn Subscriber<T, E>>;

impl<T, E, S> Subscriber<T, E> for Box<S>
where
  S: Subscriber<T, E> + ?Sized,
{
  #[inline]
  fn receive(&mut self, value: T) -> Demand { (**self).receive(value) }

  #[inline]
  fn receive_completion(&mut self, completion: Completion<E>) {
    (**self).receive_completion(completion)
  }
}

/// Closure adapter: `on_value` for every value, `on_completion` for the
/// terminal event.
///
/// A sink never grants additional demand from `receive`; pair it with an
/// upfront request, as [`Publisher::sink`](crate::publisher::Publisher::sink)
/// does with unlimited demand.
#[derive(Clone)]
pub struct Sink<N, C> {
  on_value: N,
  on_completion: Option<C>,
}

impl<N, C> Sink<N, C> {
  pub fn new(on_value: N, on_completion: C) -> Self {
    Sink { on_value, on_completion: Some(on_completion) }
  }
}

impl<T, E, N, C> Subscriber<T, E> for Sink<N, C>
where
  N: FnMut(T) + Send,
  C: FnOnce(Completion<E>) + Send,
{
  #[inline]
  fn receive(&mut self, value: T) -> Demand {
    (self.on_value)(value);
    Demand::none()
  }

  fn receive_completion(&mut self, completion: Completion<E>) {
    if let Some(on_completion) = self.on_completion.take() {
      on_completion(completion);
    }
  }
}
