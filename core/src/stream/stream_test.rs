use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use super::{Emitter, Event, Handler, Stream};
use crate::errors::{Error, ErrorKind, Result};
use crate::values::Value;

fn number(n: f64) -> Value {
    Value::Number(n)
}

fn numbers(ns: &[f64]) -> Stream {
    Stream::from_sequence(ns.iter().copied().map(Value::Number))
}

fn values(ns: &[f64]) -> Vec<Event> {
    ns.iter().map(|n| Event::Value(number(*n))).collect()
}

fn double(value: Value) -> Result<Value> {
    Ok(number(value.as_number().unwrap_or_default() * 2.0))
}

/// Pushes 0, 1, 2, ... and never closes on its own.
async fn naturals(out: Emitter, pushed: Rc<Cell<usize>>) -> Result<()> {
    loop {
        out.value(number(pushed.get() as f64)).await?;
        pushed.set(pushed.get() + 1);
    }
}

#[tokio::test]
async fn of_emits_once_then_closes() {
    assert_eq!(Stream::of(number(1.0)).collect().await.unwrap(), values(&[1.0]));
}

#[tokio::test]
async fn error_emits_on_the_error_channel() {
    let events = Stream::error(Value::text("boom")).collect().await.unwrap();
    assert_eq!(events, vec![Event::Error(Value::text("boom"))]);
}

#[tokio::test]
async fn empty_closes_without_events() {
    assert_eq!(Stream::empty().collect().await.unwrap(), vec![]);
}

#[tokio::test]
async fn from_sequence_preserves_order() {
    assert_eq!(numbers(&[3.0, 1.0, 2.0]).collect().await.unwrap(), values(&[3.0, 1.0, 2.0]));
}

#[tokio::test]
async fn running_twice_is_an_error() {
    let stream = Stream::of(number(1.0));
    stream.run().await.unwrap();
    let error = stream.run().await.unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::StreamAlreadyRunning { .. }));
}

#[tokio::test]
async fn every_listener_sees_every_event() {
    let stream = numbers(&[1.0, 2.0]);
    let first = Rc::new(Cell::new(0.0));
    let closes = Rc::new(Cell::new(0));
    let sum = first.clone();
    let closed = closes.clone();
    stream.subscribe(Handler::new(
        move |value| {
            sum.set(sum.get() + value.as_number().unwrap_or_default());
            std::future::ready(Ok(()))
        },
        |_| std::future::ready(Ok(())),
        move || {
            closed.set(closed.get() + 1);
            std::future::ready(Ok(()))
        },
    ));
    let events = stream.collect().await.unwrap();
    assert_eq!(events, values(&[1.0, 2.0]));
    assert_eq!(first.get(), 3.0);
    assert_eq!(closes.get(), 1);
}

#[tokio::test]
async fn unsubscribed_listeners_are_not_called() {
    let stream = numbers(&[1.0]);
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let id = stream.subscribe(Handler::new(
        move |_| {
            counter.set(counter.get() + 1);
            std::future::ready(Ok(()))
        },
        |_| std::future::ready(Ok(())),
        || std::future::ready(Ok(())),
    ));
    assert!(stream.unsubscribe(id));
    assert!(!stream.unsubscribe(id));
    stream.run().await.unwrap();
    assert_eq!(calls.get(), 0);
}

#[tokio::test]
async fn failing_listener_aborts_the_run() {
    let stream = numbers(&[1.0, 2.0, 3.0]);
    let seen = Rc::new(Cell::new(0));
    let counter = seen.clone();
    stream.subscribe(Handler::new(
        move |_| {
            counter.set(counter.get() + 1);
            std::future::ready(Err(Error::runtime("listener exploded")))
        },
        |_| std::future::ready(Ok(())),
        || std::future::ready(Ok(())),
    ));
    let error = stream.run().await.unwrap_err();
    assert_eq!(error.to_string(), "RuntimeError: listener exploded");
    assert_eq!(seen.get(), 1);
}

#[tokio::test]
async fn producers_that_return_are_closed_for_them() {
    let stream = Stream::from_fn("silent", |out: Emitter| async move {
        out.value(number(7.0)).await
    });
    assert_eq!(stream.collect().await.unwrap(), values(&[7.0]));
    assert!(stream.is_closed());
}

#[tokio::test]
async fn chain_fans_out_in_order() {
    let stream = numbers(&[1.0, 2.0]).chain(|value| {
        let n = value.as_number().unwrap_or_default();
        Ok(numbers(&[n, n * 10.0]))
    });
    assert_eq!(stream.collect().await.unwrap(), values(&[1.0, 10.0, 2.0, 20.0]));
}

#[tokio::test]
async fn chain_passes_errors_through() {
    let stream = Stream::error(Value::text("bad")).chain(|value| Ok(Stream::of(value)));
    assert_eq!(stream.collect().await.unwrap(), vec![Event::Error(Value::text("bad"))]);
}

#[tokio::test]
async fn chain_callback_failures_are_fatal() {
    let stream = numbers(&[1.0]).chain(|_| Err(Error::assertion("no streams today")));
    let error = stream.collect().await.unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::Assertion { .. }));
}

#[tokio::test]
async fn map_and_map_error() {
    let mapped = numbers(&[1.0, 2.0]).map(double);
    assert_eq!(mapped.collect().await.unwrap(), values(&[2.0, 4.0]));

    let errors = Stream::error(number(4.0)).map_error(double);
    assert_eq!(errors.collect().await.unwrap(), vec![Event::Error(number(8.0))]);
}

#[tokio::test]
async fn bimap_touches_both_channels() {
    let stream = Stream::of(number(1.0))
        .concat(&Stream::error(number(5.0)))
        .bimap(double, |error| Ok(Value::text(format!("e{}", error.show()))));
    assert_eq!(
        stream.collect().await.unwrap(),
        vec![Event::Value(number(2.0)), Event::Error(Value::text("e5"))]
    );
}

#[tokio::test]
async fn swap_exchanges_channels() {
    let stream = Stream::of(number(1.0)).concat(&Stream::error(number(2.0))).swap();
    assert_eq!(
        stream.collect().await.unwrap(),
        vec![Event::Error(number(1.0)), Event::Value(number(2.0))]
    );
}

#[tokio::test]
async fn or_else_recovers_errors() {
    let stream = Stream::error(number(3.0)).or_else(|error| Ok(Stream::of(error)));
    assert_eq!(stream.collect().await.unwrap(), values(&[3.0]));
}

#[tokio::test]
async fn concat_plays_streams_back_to_back() {
    let stream = numbers(&[1.0, 2.0]).concat(&numbers(&[3.0]));
    assert_eq!(stream.collect().await.unwrap(), values(&[1.0, 2.0, 3.0]));
}

#[tokio::test]
async fn concat_stops_after_an_error() {
    let stream = Stream::error(Value::text("halt")).concat(&numbers(&[3.0]));
    assert_eq!(stream.collect().await.unwrap(), vec![Event::Error(Value::text("halt"))]);
}

#[tokio::test]
async fn merge_forwards_both_and_waits_for_both() {
    let stream = numbers(&[1.0, 2.0]).merge(&numbers(&[10.0, 20.0]));
    let mut seen: Vec<f64> = stream
        .collect()
        .await
        .unwrap()
        .into_iter()
        .filter_map(|event| match event {
            Event::Value(value) => value.as_number(),
            Event::Error(_) => None,
        })
        .collect();
    seen.sort_by(f64::total_cmp);
    assert_eq!(seen, vec![1.0, 2.0, 10.0, 20.0]);
}

#[tokio::test]
async fn merge_keeps_each_input_in_order() {
    let stream = numbers(&[1.0, 2.0, 3.0]).merge(&Stream::empty());
    assert_eq!(stream.collect().await.unwrap(), values(&[1.0, 2.0, 3.0]));
}

#[tokio::test]
async fn fold_emits_the_total_on_close() {
    let stream = numbers(&[1.0, 2.0, 3.0]).fold(number(0.0), |total, value| {
        Ok(number(total.as_number().unwrap_or_default() + value.as_number().unwrap_or_default()))
    });
    assert_eq!(stream.collect().await.unwrap(), values(&[6.0]));
}

#[tokio::test]
async fn fold_forwards_errors_unaccumulated() {
    let source = Stream::of(number(2.0)).concat(&Stream::error(Value::text("skip")));
    let stream = source.fold(number(1.0), |total, value| {
        Ok(number(total.as_number().unwrap_or_default() * value.as_number().unwrap_or_default()))
    });
    assert_eq!(
        stream.collect().await.unwrap(),
        vec![Event::Error(Value::text("skip")), Event::Value(number(2.0))]
    );
}

#[tokio::test]
async fn take_closes_after_n_values() {
    let stream = numbers(&[1.0, 2.0, 3.0, 4.0]).take(2);
    assert_eq!(stream.collect().await.unwrap(), values(&[1.0, 2.0]));
}

#[tokio::test]
async fn take_zero_never_runs_the_upstream() {
    let upstream = numbers(&[1.0]);
    let stream = upstream.take(0);
    assert_eq!(stream.collect().await.unwrap(), vec![]);
    assert!(!upstream.is_running());
}

#[tokio::test]
async fn take_stops_an_unbounded_upstream() {
    let pushed = Rc::new(Cell::new(0));
    let counter = pushed.clone();
    let stream = Stream::from_fn("naturals", move |out| naturals(out, counter)).take(3);
    assert_eq!(stream.collect().await.unwrap(), values(&[0.0, 1.0, 2.0]));
    assert!(pushed.get() < 10);
}

#[tokio::test]
async fn drop_skips_the_first_values() {
    let stream = numbers(&[1.0, 2.0, 3.0]).drop(2);
    assert_eq!(stream.collect().await.unwrap(), values(&[3.0]));
}

#[tokio::test]
async fn filter_and_tap() {
    let tapped = Rc::new(Cell::new(0));
    let counter = tapped.clone();
    let stream = numbers(&[1.0, 2.0, 3.0, 4.0])
        .tap(move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        })
        .filter(|value| Ok(value.as_number().unwrap_or_default() % 2.0 == 0.0));
    assert_eq!(stream.collect().await.unwrap(), values(&[2.0, 4.0]));
    assert_eq!(tapped.get(), 4);
}

#[tokio::test]
async fn and_then_waits_for_close() {
    let stream = numbers(&[1.0, 2.0]).and_then(|| Ok(Stream::of(number(9.0))));
    assert_eq!(stream.collect().await.unwrap(), values(&[9.0]));
}

#[tokio::test]
async fn and_then_skips_the_continuation_after_an_error() {
    let ran = Rc::new(Cell::new(false));
    let flag = ran.clone();
    let stream = Stream::error(Value::text("stop")).and_then(move || {
        flag.set(true);
        Ok(Stream::of(number(1.0)))
    });
    assert_eq!(stream.collect().await.unwrap(), vec![Event::Error(Value::text("stop"))]);
    assert!(!ran.get());
}

fn numbers_in(events: &[Event]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Value(value) => value.as_number(),
            Event::Error(_) => None,
        })
        .collect()
}

#[tokio::test]
async fn take_over_a_merge_forwards_exactly_n_values() {
    let stream = numbers(&[1.0, 2.0, 3.0])
        .merge(&numbers(&[10.0, 20.0, 30.0]))
        .take(4);
    let seen = numbers_in(&stream.collect().await.unwrap());
    assert_eq!(seen.len(), 4);

    let (small, large): (Vec<f64>, Vec<f64>) = seen.into_iter().partition(|n| *n < 10.0);
    assert_eq!(small, [1.0, 2.0, 3.0][..small.len()]);
    assert_eq!(large, [10.0, 20.0, 30.0][..large.len()]);
}

#[tokio::test]
async fn take_over_a_merge_of_unbounded_inputs() {
    let (left, right) = (Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));
    let (left_count, right_count) = (left.clone(), right.clone());
    let stream = Stream::from_fn("left", move |out| naturals(out, left_count))
        .merge(&Stream::from_fn("right", move |out| naturals(out, right_count)))
        .take(4);

    let events = stream.collect().await.unwrap();
    assert_eq!(events.len(), 4);
    assert!(left.get() + right.get() < 20);
}

#[tokio::test]
async fn pushes_from_shared_emitters_arrive_in_push_order() {
    let stream = Stream::from_fn("shared", |out: Emitter| async move {
        let (first, second) = (out.clone(), out.clone());
        tokio::try_join!(
            async move {
                first.value(number(1.0)).await?;
                first.value(number(2.0)).await
            },
            async move {
                second.value(number(10.0)).await?;
                second.value(number(20.0)).await
            },
        )?;
        out.close().await
    });
    let seen = numbers_in(&stream.collect().await.unwrap());
    assert_eq!(seen, vec![1.0, 10.0, 2.0, 20.0]);
}

#[tokio::test]
async fn merge_closes_exactly_once() {
    let stream = numbers(&[1.0, 2.0]).merge(&numbers(&[10.0]));
    let closes = Rc::new(Cell::new(0));
    let counter = closes.clone();
    stream.subscribe(Handler::new(
        |_| std::future::ready(Ok(())),
        |_| std::future::ready(Ok(())),
        move || {
            counter.set(counter.get() + 1);
            std::future::ready(Ok(()))
        },
    ));
    let events = stream.collect().await.unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(closes.get(), 1);
}

#[tokio::test]
async fn merge_forwards_errors_without_closing_early() {
    let stream = Stream::error(Value::text("e")).merge(&numbers(&[1.0, 2.0]));
    let events = stream.collect().await.unwrap();
    assert_eq!(events.len(), 3);
    assert!(events.contains(&Event::Error(Value::text("e"))));
    assert_eq!(numbers_in(&events), vec![1.0, 2.0]);
}

#[tokio::test]
async fn concat_of_three_keeps_each_stream_in_turn() {
    let stream = numbers(&[1.0, 2.0])
        .concat(&numbers(&[3.0]))
        .concat(&numbers(&[4.0, 5.0]));
    assert_eq!(stream.collect().await.unwrap(), values(&[1.0, 2.0, 3.0, 4.0, 5.0]));
}
