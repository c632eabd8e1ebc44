//! # rxreplay: demand-driven replay streams
//!
//! A small reactive core where consumers pace producers. Every subscription
//! grants [`Demand`] explicitly, values that arrive without demand wait in a
//! per-subscription buffer, and a subject can replay its recent history to
//! subscriptions that join late.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxreplay::prelude::*;
//! use std::sync::{Arc, Mutex};
//!
//! let subject = ReplaySubject::<i32, ()>::new(2);
//! subject.send(1);
//! subject.send(2);
//! subject.send(3);
//!
//! let seen = Arc::new(Mutex::new(vec![]));
//! let c_seen = seen.clone();
//! let subscription = subject.subscribe(Sink::new(move |v| c_seen.lock().unwrap().push(v), |_| {}));
//! subscription.request(Demand::max(1));
//! assert_eq!(*seen.lock().unwrap(), vec![2]);
//!
//! subscription.request(Demand::unlimited());
//! subject.send(4);
//! assert_eq!(*seen.lock().unwrap(), vec![2, 3, 4]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Demand`] | How many more values a subscriber accepts, possibly unlimited |
//! | [`DemandBuffer`] | Holds values until demand releases them |
//! | [`ReplaySubject`] | Multicast subject replaying its last `n` values |
//! | [`OperationStream`] | One asynchronous operation exposed as a stream |
//! | [`Subscription`] | Handle to request values from, or cancel, a stream |
//!
//! ## Feature Flags
//!
//! - **`futures-scheduler`** (default): run operations on a shared `futures` thread pool
//! - **`tokio-scheduler`**: run operations on a Tokio runtime handle
//!
//! [`DemandBuffer`]: buffer::DemandBuffer
//! [`ReplaySubject`]: subject::ReplaySubject
//! [`OperationStream`]: bridge::OperationStream
//! [`Subscription`]: subscription::Subscription

pub mod bridge;
pub mod buffer;
pub mod demand;
pub mod into_stream;
pub mod prelude;
pub mod publisher;
pub(crate) mod rc;
pub mod scheduler;
pub mod subject;
pub mod subscriber;
pub mod subscription;

pub use prelude::*;
