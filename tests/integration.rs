//! Integration tests for rxreplay
//!
//! Exercises subjects, operation bridges and the stream adapter together,
//! across threads.

use std::{
  sync::{Arc, Mutex},
  thread,
  time::Duration,
};

use futures::StreamExt;
use rxreplay::prelude::*;

fn init_tracing() {
  let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[derive(Debug, Clone, PartialEq)]
enum Event<T> {
  Value(T),
  Done(Completion<String>),
}

/// Records every event and grants `refill` more demand per value.
struct Recorder<T> {
  events: Arc<Mutex<Vec<Event<T>>>>,
  refill: Demand,
}

impl<T> Recorder<T> {
  fn new(refill: Demand) -> (Self, Arc<Mutex<Vec<Event<T>>>>) {
    let events = Arc::new(Mutex::new(vec![]));
    (Recorder { events: events.clone(), refill }, events)
  }
}

impl<T: Send> Subscriber<T, String> for Recorder<T> {
  fn receive(&mut self, value: T) -> Demand {
    self.events.lock().unwrap().push(Event::Value(value));
    self.refill
  }

  fn receive_completion(&mut self, completion: Completion<String>) {
    self.events.lock().unwrap().push(Event::Done(completion));
  }
}

#[test]
fn late_subscribers_catch_up_at_their_own_pace() {
  init_tracing();
  let subject = ReplaySubject::<u32, String>::new(3);
  for v in 1..=5 {
    subject.send(v);
  }

  let (fast, fast_events) = Recorder::new(Demand::none());
  let fast = subject.subscribe(fast);
  fast.request(Demand::unlimited());

  let (slow, slow_events) = Recorder::new(Demand::none());
  let slow = subject.subscribe(slow);
  slow.request(Demand::max(1));

  subject.send(6);
  subject.send_completion(Ok(()));

  assert_eq!(
    *fast_events.lock().unwrap(),
    vec![
      Event::Value(3),
      Event::Value(4),
      Event::Value(5),
      Event::Value(6),
      Event::Done(Ok(()))
    ]
  );
  assert_eq!(*slow_events.lock().unwrap(), vec![Event::Value(3)]);

  slow.request(Demand::max(2));
  assert_eq!(slow_events.lock().unwrap().len(), 3);
  slow.request(Demand::max(1));
  assert_eq!(slow_events.lock().unwrap().last(), Some(&Event::Done(Ok(()))));
  assert_eq!(slow_events.lock().unwrap().len(), 5);
}

#[test]
fn demand_returned_from_receive_keeps_values_flowing() {
  init_tracing();
  let subject = ReplaySubject::<u32, String>::new(10);
  for v in 0..10 {
    subject.send(v);
  }
  let (recorder, events) = Recorder::new(Demand::max(1));
  let subscription = subject.subscribe(recorder).unsubscribe_when_dropped();
  subscription.request(Demand::max(1));
  assert_eq!(events.lock().unwrap().len(), 10);
}

#[test]
fn producers_on_many_threads() {
  init_tracing();
  let subject = ReplaySubject::<(usize, usize), String>::new(0);
  let (recorder, events) = Recorder::new(Demand::none());
  let subscription = subject.subscribe(recorder);
  subscription.request(Demand::unlimited());

  let producers: Vec<_> = (0..4)
    .map(|producer| {
      let subject = subject.clone();
      thread::spawn(move || {
        for seq in 0..250 {
          subject.send((producer, seq));
        }
      })
    })
    .collect();
  for producer in producers {
    producer.join().unwrap();
  }
  subject.send_completion(Err("shutdown".to_owned()));

  let events = events.lock().unwrap();
  assert_eq!(events.len(), 1001);
  assert_eq!(events.last(), Some(&Event::Done(Err("shutdown".to_owned()))));
  let mut next = [0; 4];
  for event in events.iter() {
    if let Event::Value((producer, seq)) = event {
      assert_eq!(*seq, next[*producer]);
      next[*producer] += 1;
    }
  }
}

#[test]
fn guard_detaches_from_the_subject() {
  init_tracing();
  let subject = ReplaySubject::<u32, String>::new(1);
  {
    let (recorder, _) = Recorder::new(Demand::none());
    let _guard = subject.subscribe(recorder).unsubscribe_when_dropped();
    assert_eq!(subject.subscriber_count(), 1);
  }
  assert_eq!(subject.subscriber_count(), 0);
}

#[test]
fn operation_result_is_shared_by_every_subscriber() {
  init_tracing();
  let scheduler = TestScheduler::default();
  let operation = OperationStream::<String, String>::with_scheduler(
    || async { Ok("payload".to_owned()) },
    scheduler.clone(),
  );

  let (first, first_events) = Recorder::new(Demand::none());
  let first = operation.subscribe(first);
  first.request(Demand::max(1));
  assert_eq!(operation.state(), OperationState::Running);
  scheduler.run_until_stalled();
  assert_eq!(operation.state(), OperationState::Delivered);

  let (second, second_events) = Recorder::new(Demand::none());
  operation.subscribe(second).request(Demand::unlimited());

  let expected = vec![Event::Value("payload".to_owned()), Event::Done(Ok(()))];
  assert_eq!(*first_events.lock().unwrap(), expected);
  assert_eq!(*second_events.lock().unwrap(), expected);
}

#[test]
fn cancelled_operation_never_reports() {
  init_tracing();
  let scheduler = TestScheduler::default();
  let (tx, rx) = futures::channel::oneshot::channel::<u32>();
  let operation = OperationStream::<u32, String>::with_scheduler(
    move || async move { rx.await.map_err(|e| e.to_string()) },
    scheduler.clone(),
  );

  let (recorder, events) = Recorder::new(Demand::none());
  let subscription = operation.subscribe(recorder);
  subscription.request(Demand::max(1));
  scheduler.run_until_stalled();
  subscription.cancel();
  let _ = tx.send(1);
  scheduler.run_until_stalled();

  assert_eq!(operation.state(), OperationState::Cancelled);
  assert!(events.lock().unwrap().is_empty());

  let (late, late_events) = Recorder::new(Demand::none());
  let late = operation.subscribe(late);
  assert!(late.is_closed());
  late.request(Demand::unlimited());
  assert!(late_events.lock().unwrap().is_empty());

  let late_values: Vec<_> = futures::executor::block_on(operation.into_stream().collect());
  assert!(late_values.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn subject_as_async_stream() {
  init_tracing();
  let subject = ReplaySubject::<u32, String>::new(0);
  let stream = subject.into_stream();

  let producer = subject.clone();
  let handle = thread::spawn(move || {
    for v in 0..5 {
      thread::sleep(Duration::from_millis(1));
      producer.send(v);
    }
    producer.send_completion(Ok(()));
  });

  let values: Vec<_> = stream.collect().await;
  handle.join().unwrap();
  assert_eq!(values, (0..5).map(Ok).collect::<Vec<Result<u32, String>>>());
}

#[cfg(feature = "tokio-scheduler")]
#[tokio::test(flavor = "multi_thread")]
async fn operation_on_a_tokio_runtime() {
  init_tracing();
  let operation = OperationStream::<u32, String>::with_scheduler(
    || async {
      tokio::time::sleep(Duration::from_millis(5)).await;
      Ok(7)
    },
    tokio::runtime::Handle::current(),
  );
  let mut stream = operation.into_stream();
  assert_eq!(stream.next().await, Some(Ok(7)));
  assert_eq!(stream.next().await, None);
  assert_eq!(operation.state(), OperationState::Delivered);
}
