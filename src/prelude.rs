//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Demand accounting
pub use crate::buffer::{DemandBuffer, HistoryBuffer};
pub use crate::demand::Demand;
// Operation bridge
pub use crate::bridge::{OperationState, OperationStream, OperationSubscription};
// Stream adapter
pub use crate::into_stream::IntoStream;
// Core traits
pub use crate::publisher::Publisher;
// Schedulers
#[cfg(feature = "futures-scheduler")]
pub use crate::scheduler::default_scheduler;
pub use crate::scheduler::{Scheduler, TaskHandle, TestScheduler};
// Subject
pub use crate::subject::*;
pub use crate::subscriber::{Completion, Sink, Subscriber};
// Subscription
pub use crate::subscription::*;
