//! Demand: how many more values a subscriber is willing to receive.

use std::{cmp::Ordering, fmt, ops::Add};

/// A subscriber's declared capacity to receive values.
///
/// Demand is either a finite count or unlimited. Every finite demand orders
/// below [`Demand::unlimited`], so `Demand::max(3) < Demand::unlimited()`.
///
/// ```rust
/// use rxreplay::Demand;
///
/// assert_eq!(Demand::max(2) + Demand::max(3), Demand::max(5));
/// assert!((Demand::max(1) + Demand::unlimited()).is_unlimited());
/// assert!(Demand::none().is_none());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Demand(Option<usize>);

impl Demand {
  /// No demand at all.
  #[inline]
  pub const fn none() -> Self { Demand(Some(0)) }

  /// A finite demand of `count` values.
  #[inline]
  pub const fn max(count: usize) -> Self { Demand(Some(count)) }

  /// Demand that is never exhausted.
  #[inline]
  pub const fn unlimited() -> Self { Demand(None) }

  #[inline]
  pub fn is_none(&self) -> bool { self.0 == Some(0) }

  #[inline]
  pub fn is_unlimited(&self) -> bool { self.0.is_none() }

  /// The finite count, or `None` if the demand is unlimited.
  #[inline]
  pub fn finite(&self) -> Option<usize> { self.0 }

  /// Consumes one unit of demand for a delivered value.
  ///
  /// Unlimited demand is left untouched. Consuming from zero demand means a
  /// value was delivered without being requested.
  #[inline]
  pub(crate) fn consume_one(&mut self) {
    if let Some(count) = self.0.as_mut() {
      debug_assert!(*count > 0, "delivered a value without outstanding demand");
      *count = count.saturating_sub(1);
    }
  }
}

impl Default for Demand {
  #[inline]
  fn default() -> Self { Demand::none() }
}

impl From<usize> for Demand {
  #[inline]
  fn from(count: usize) -> Self { Demand::max(count) }
}

/// Saturating: a finite sum that overflows becomes unlimited.
impl Add for Demand {
  type Output = Demand;

  fn add(self, rhs: Demand) -> Demand {
    match (self.0, rhs.0) {
      (Some(a), Some(b)) => Demand(a.checked_add(b)),
      _ => Demand::unlimited(),
    }
  }
}

impl Ord for Demand {
  fn cmp(&self, other: &Self) -> Ordering {
    match (self.0, other.0) {
      (Some(a), Some(b)) => a.cmp(&b),
      (Some(_), None) => Ordering::Less,
      (None, Some(_)) => Ordering::Greater,
      (None, None) => Ordering::Equal,
    }
  }
}

impl PartialOrd for Demand {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl fmt::Debug for Demand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.finite() {
      Some(count) => write!(f, "Demand::max({count})"),
      None => f.write_str("Demand::unlimited"),
    }
  }
}
