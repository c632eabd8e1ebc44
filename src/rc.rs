use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Exclusive access to a lock's content.
///
/// A subscriber that panicked inside a callback poisons whatever lock the
/// delivering thread held; the state behind it is still consistent, so the
/// guard is recovered instead of propagating the panic.
pub(crate) trait RcDerefMut {
  type Target;
  fn rc_deref_mut(&self) -> MutexGuard<'_, Self::Target>;
}

impl<T> RcDerefMut for Mutex<T> {
  type Target = T;

  #[inline]
  fn rc_deref_mut(&self) -> MutexGuard<'_, T> { self.lock().unwrap_or_else(PoisonError::into_inner) }
}

/// Shared, lockable state.
pub(crate) struct MutArc<T>(Arc<Mutex<T>>);

impl<T> MutArc<T> {
  pub(crate) fn own(t: T) -> Self { Self(Arc::new(Mutex::new(t))) }

  pub(crate) fn downgrade(&self) -> WeakMutArc<T> { WeakMutArc(Arc::downgrade(&self.0)) }
}

impl<T> RcDerefMut for MutArc<T> {
  type Target = T;

  #[inline]
  fn rc_deref_mut(&self) -> MutexGuard<'_, T> { self.0.rc_deref_mut() }
}

impl<T> Clone for MutArc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

/// Non-owning counterpart of [`MutArc`].
pub(crate) struct WeakMutArc<T>(Weak<Mutex<T>>);

impl<T> WeakMutArc<T> {
  pub(crate) fn upgrade(&self) -> Option<MutArc<T>> { self.0.upgrade().map(MutArc) }
}

impl<T> Clone for WeakMutArc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}
