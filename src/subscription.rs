//! Subscription handles: the consumer's side of demand and cancellation.

use std::ops::Deref;

use crate::demand::Demand;

mod outlet;

pub(crate) use outlet::Outlet;

/// Handle through which a consumer paces and ends its stream.
pub trait Subscription {
  /// Grants `demand` more values. Zero demand is a no-op; demand on a closed
  /// subscription is ignored.
  fn request(&self, demand: Demand);

  /// Stops delivery. Nothing reaches the subscriber once this returns, values
  /// still buffered for it are discarded, and calling it again has no further
  /// effect.
  fn cancel(&self);

  /// Whether the subscription has been cancelled or has delivered its
  /// terminal event.
  fn is_closed(&self) -> bool;

  /// Activates "RAII" behavior for this subscription: `cancel()` is called as
  /// soon as the returned guard goes out of scope.
  ///
  /// **Attention:** if you don't bind the return value to a variable, the
  /// subscription is cancelled immediately.
  fn unsubscribe_when_dropped(self) -> SubscriptionGuard<Self>
  where
    Self: Sized,
  {
    SubscriptionGuard(self)
  }
}

/// An RAII implementation of a "scoped subscription". When this structure is
/// dropped (falls out of scope), the subscription is cancelled.
///
/// If you want to drop it immediately, wrap it in its own scope.
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard<S: Subscription>(S);

impl<S: Subscription> SubscriptionGuard<S> {
  /// Wraps an existing subscription with a guard to enable RAII behavior for
  /// it.
  pub fn new(subscription: S) -> Self { SubscriptionGuard(subscription) }
}

impl<S: Subscription> Deref for SubscriptionGuard<S> {
  type Target = S;

  #[inline]
  fn deref(&self) -> &S { &self.0 }
}

impl<S: Subscription> Drop for SubscriptionGuard<S> {
  #[inline]
  fn drop(&mut self) { self.0.cancel() }
}
