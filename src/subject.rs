//! Multicast subjects.

mod replay_subject;
mod subject_subscription;
mod subscribers;

pub use replay_subject::ReplaySubject;
pub use subject_subscription::ReplaySubscription;
