use std::{
  collections::VecDeque,
  sync::Mutex,
  thread::{self, ThreadId},
};

use tracing::trace;

use crate::{
  buffer::DemandBuffer,
  demand::Demand,
  rc::RcDerefMut,
  subscriber::{BoxedSubscriber, Completion},
};

/// Per-subscription delivery driver shared by every publisher.
///
/// Producers push values and the terminal event into the state under its
/// lock; whatever the demand buffer releases moves to the `ready` queue. One
/// thread at a time, the deliverer, drains `ready` into the subscriber with
/// no state lock held, so a subscriber may call back into `request`,
/// `cancel` or its publisher from inside a callback. A re-entrant call only
/// does bookkeeping; the deliverer already running picks up what it released.
///
/// The subscriber sits behind its own lock, held by the deliverer for the
/// length of one callback. Lock order is `subscriber` then `state`, and
/// nothing takes `subscriber` while holding `state`.
pub(crate) struct Outlet<T, E> {
  state: Mutex<OutletState<T, E>>,
  subscriber: Mutex<Option<BoxedSubscriber<T, E>>>,
}

struct OutletState<T, E> {
  buffer: DemandBuffer<T>,
  ready: VecDeque<T>,
  completion: Option<Completion<E>>,
  closed: bool,
  /// The terminal callback is running. The outlet takes nothing more but
  /// only reports closed once the callback has returned.
  completing: bool,
  deliverer: Option<ThreadId>,
}

enum Event<T, E> {
  Value(T),
  Completion(Completion<E>),
}

impl<T, E> OutletState<T, E> {
  fn next_event(&mut self) -> Option<Event<T, E>> {
    if self.closed {
      return None;
    }
    if let Some(value) = self.ready.pop_front() {
      return Some(Event::Value(value));
    }
    if self.buffer.is_empty() {
      if let Some(completion) = self.completion.take() {
        self.closed = true;
        self.completing = true;
        return Some(Event::Completion(completion));
      }
    }
    None
  }

  fn release(&mut self, demand: Demand) {
    let ready = self.buffer.request(demand);
    self.ready.extend(ready);
  }
}

impl<T, E> Outlet<T, E> {
  /// An outlet whose buffer starts out holding `replay`.
  pub(crate) fn new(subscriber: BoxedSubscriber<T, E>, replay: Vec<T>) -> Self {
    Outlet {
      state: Mutex::new(OutletState {
        buffer: DemandBuffer::with_values(replay),
        ready: VecDeque::new(),
        completion: None,
        closed: false,
        completing: false,
        deliverer: None,
      }),
      subscriber: Mutex::new(Some(subscriber)),
    }
  }

  /// Queues a live value. Call [`Outlet::drain`] once no publisher lock is
  /// held.
  pub(crate) fn push(&self, value: T) {
    let mut state = self.state.rc_deref_mut();
    if state.closed || state.completion.is_some() {
      return;
    }
    let ready = state.buffer.append(value);
    state.ready.extend(ready);
  }

  /// Queues the terminal event behind every value already queued. Only the
  /// first one counts.
  pub(crate) fn push_completion(&self, completion: Completion<E>) {
    let mut state = self.state.rc_deref_mut();
    if state.closed || state.completion.is_some() {
      return;
    }
    state.completion = Some(completion);
  }

  pub(crate) fn request(&self, demand: Demand) {
    {
      let mut state = self.state.rc_deref_mut();
      if state.closed {
        return;
      }
      state.release(demand);
    }
    self.drain();
  }

  /// Closes the outlet and discards everything queued. Returns `false` if it
  /// was already closed.
  ///
  /// Called from any thread but the deliverer's, this waits for an in-flight
  /// callback to return, so nothing is delivered once it returns. Called from
  /// inside a callback, the deliverer retires the subscriber when the
  /// callback returns.
  pub(crate) fn cancel(&self) -> bool {
    let (was_open, reentrant) = {
      let mut state = self.state.rc_deref_mut();
      let was_open = !state.closed;
      state.closed = true;
      state.buffer.clear();
      state.ready.clear();
      state.completion = None;
      (was_open, state.deliverer == Some(thread::current().id()))
    };
    if was_open {
      trace!(reentrant, "subscription cancelled");
    }
    if !reentrant {
      let retired = self.subscriber.rc_deref_mut().take();
      drop(retired);
    }
    was_open
  }

  /// Cancelled, or its terminal event has been fully delivered.
  pub(crate) fn is_closed(&self) -> bool {
    let state = self.state.rc_deref_mut();
    state.closed && !state.completing
  }

  /// Delivers everything deliverable, unless another call is already doing
  /// so, in which case that call delivers it.
  pub(crate) fn drain(&self) {
    {
      let mut state = self.state.rc_deref_mut();
      if state.deliverer.is_some() {
        return;
      }
      state.deliverer = Some(thread::current().id());
    }

    let mut retired = None;
    loop {
      let mut slot = self.subscriber.rc_deref_mut();
      let mut state = self.state.rc_deref_mut();
      let next = match slot.as_mut() {
        Some(target) => state.next_event().map(|event| (target, event)),
        None => None,
      };
      let Some((target, event)) = next else {
        state.deliverer = None;
        if state.closed {
          retired = slot.take();
        }
        break;
      };
      drop(state);

      match event {
        Event::Value(value) => {
          let more = target.receive(value);
          if !more.is_none() {
            let mut state = self.state.rc_deref_mut();
            if !state.closed {
              state.release(more);
            }
          }
        }
        Event::Completion(completion) => {
          target.receive_completion(completion);
          retired = slot.take();
          drop(slot);
          let mut state = self.state.rc_deref_mut();
          state.deliverer = None;
          state.completing = false;
          break;
        }
      }
    }
    drop(retired);
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use super::*;
  use crate::subscriber::Subscriber;

  type Log = Arc<Mutex<Vec<String>>>;

  struct Recorder {
    log: Log,
    per_value: Demand,
  }

  impl Subscriber<i32, &'static str> for Recorder {
    fn receive(&mut self, value: i32) -> Demand {
      self.log.lock().unwrap().push(value.to_string());
      self.per_value
    }

    fn receive_completion(&mut self, completion: Completion<&'static str>) {
      self.log.lock().unwrap().push(format!("{completion:?}"));
    }
  }

  fn outlet(per_value: Demand, replay: Vec<i32>) -> (Outlet<i32, &'static str>, Log) {
    let log = Log::default();
    let recorder = Recorder { log: log.clone(), per_value };
    (Outlet::new(Box::new(recorder), replay), log)
  }

  #[test]
  fn replay_waits_for_demand() {
    let (outlet, log) = outlet(Demand::none(), vec![1, 2, 3]);
    outlet.drain();
    assert!(log.lock().unwrap().is_empty());

    outlet.request(Demand::max(2));
    assert_eq!(*log.lock().unwrap(), ["1", "2"]);
  }

  #[test]
  fn demand_returned_from_receive_keeps_flowing() {
    let (outlet, log) = outlet(Demand::max(1), vec![1, 2, 3]);
    outlet.request(Demand::max(1));
    assert_eq!(*log.lock().unwrap(), ["1", "2", "3"]);
  }

  #[test]
  fn completion_waits_behind_buffered_values() {
    let (outlet, log) = outlet(Demand::none(), vec![1, 2]);
    outlet.push_completion(Ok(()));
    outlet.drain();
    assert!(log.lock().unwrap().is_empty());

    outlet.request(Demand::max(1));
    assert_eq!(*log.lock().unwrap(), ["1"]);
    outlet.request(Demand::max(1));
    assert_eq!(*log.lock().unwrap(), ["1", "2", "Ok(())"]);
    assert!(outlet.is_closed());
  }

  #[test]
  fn completion_needs_no_demand() {
    let (outlet, log) = outlet(Demand::none(), vec![]);
    outlet.push_completion(Err("boom"));
    outlet.push_completion(Ok(()));
    outlet.drain();
    assert_eq!(*log.lock().unwrap(), ["Err(\"boom\")"]);
  }

  #[test]
  fn cancel_discards_and_is_idempotent() {
    let (outlet, log) = outlet(Demand::none(), vec![1, 2]);
    assert!(outlet.cancel());
    assert!(!outlet.cancel());
    outlet.push(3);
    outlet.push_completion(Ok(()));
    outlet.request(Demand::unlimited());
    assert!(log.lock().unwrap().is_empty());
    assert!(outlet.is_closed());
  }

  struct Watcher {
    outlet: Arc<Mutex<Option<Arc<Outlet<i32, ()>>>>>,
    closed_in_callback: Arc<Mutex<Option<bool>>>,
  }

  impl Subscriber<i32, ()> for Watcher {
    fn receive(&mut self, _: i32) -> Demand { Demand::none() }

    fn receive_completion(&mut self, _: Completion<()>) {
      let outlet = self.outlet.lock().unwrap().take();
      *self.closed_in_callback.lock().unwrap() = outlet.map(|outlet| outlet.is_closed());
    }
  }

  #[test]
  fn closed_only_after_the_completion_callback_returns() {
    let handle = Arc::new(Mutex::new(None));
    let closed_in_callback = Arc::new(Mutex::new(None));
    let watcher = Watcher { outlet: handle.clone(), closed_in_callback: closed_in_callback.clone() };
    let outlet = Arc::new(Outlet::new(Box::new(watcher), vec![]));
    *handle.lock().unwrap() = Some(outlet.clone());

    outlet.push_completion(Ok(()));
    assert!(!outlet.is_closed());
    outlet.drain();
    assert_eq!(*closed_in_callback.lock().unwrap(), Some(false));
    assert!(outlet.is_closed());
  }

  struct Reentrant {
    outlet: Arc<Mutex<Option<Arc<Outlet<i32, ()>>>>>,
    seen: Arc<Mutex<Vec<i32>>>,
    cancel_at: Option<i32>,
  }

  impl Subscriber<i32, ()> for Reentrant {
    fn receive(&mut self, value: i32) -> Demand {
      self.seen.lock().unwrap().push(value);
      let outlet = self.outlet.lock().unwrap().clone();
      if let Some(outlet) = outlet {
        if Some(value) == self.cancel_at {
          outlet.cancel();
        } else {
          outlet.request(Demand::max(1));
        }
      }
      Demand::none()
    }

    fn receive_completion(&mut self, _: Completion<()>) {}
  }

  #[test]
  fn reentrant_request_delivers_each_value_once() {
    let handle = Arc::new(Mutex::new(None));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let subscriber = Reentrant { outlet: handle.clone(), seen: seen.clone(), cancel_at: None };
    let outlet = Arc::new(Outlet::new(Box::new(subscriber), (0..100).collect()));
    *handle.lock().unwrap() = Some(outlet.clone());

    outlet.request(Demand::max(1));
    assert_eq!(*seen.lock().unwrap(), (0..100).collect::<Vec<_>>());
    handle.lock().unwrap().take();
  }

  #[test]
  fn reentrant_cancel_stops_delivery() {
    let handle = Arc::new(Mutex::new(None));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let subscriber = Reentrant { outlet: handle.clone(), seen: seen.clone(), cancel_at: Some(2) };
    let outlet = Arc::new(Outlet::new(Box::new(subscriber), (0..10).collect()));
    *handle.lock().unwrap() = Some(outlet.clone());

    outlet.request(Demand::max(1));
    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    assert!(outlet.is_closed());
    // The subscriber, which holds `handle`, has been dropped.
    assert_eq!(Arc::strong_count(&handle), 1);
  }
}
