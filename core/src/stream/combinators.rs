//! Stream constructors and combinators.
//!
//! Most combinators are [`Stream::match_with`] specialised: every event of
//! the upstream is turned into a sub-stream whose events are re-emitted
//! downstream.

use std::cell::{Cell, RefCell};
use std::future::ready;
use std::rc::Rc;

use super::{Emitter, Handler, Stream};
use crate::errors::Result;
use crate::values::Value;

impl Stream {
    /// Emits `value`, then closes.
    pub fn of(value: Value) -> Stream {
        Stream::from_fn("of", move |out| async move {
            out.value(value).await?;
            out.close().await
        })
    }

    /// Emits `error` on the error channel, then closes.
    pub fn error(error: Value) -> Stream {
        Stream::from_fn("error", move |out| async move {
            out.error(error).await?;
            out.close().await
        })
    }

    pub fn empty() -> Stream {
        Stream::from_fn("empty", |out| async move { out.close().await })
    }

    /// Emits each item in order, then closes.
    pub fn from_sequence(items: impl IntoIterator<Item = Value>) -> Stream {
        let items: Vec<Value> = items.into_iter().collect();
        Stream::from_fn("from-sequence", move |out| async move {
            for item in items {
                if out.is_closed() {
                    break;
                }
                out.value(item).await?;
            }
            out.close().await
        })
    }

    /// Re-dispatches every upstream event through a sub-stream.
    ///
    /// Each value, each error and the final close are mapped to a stream by
    /// the matching callback; that stream is run to completion before the
    /// upstream resumes. The result closes once the upstream and every
    /// sub-stream have closed.
    pub fn match_with<V, E, C>(&self, name: &str, on_value: V, on_error: E, on_close: C) -> Stream
    where
        V: Fn(Value) -> Result<Stream> + 'static,
        E: Fn(Value) -> Result<Stream> + 'static,
        C: Fn() -> Result<Stream> + 'static,
    {
        let upstream = self.clone();
        Stream::from_fn(name, move |out: Emitter| {
            // The upstream itself counts as one pending stream.
            let pending = Rc::new(Cell::new(1usize));

            let (value_out, value_pending) = (out.clone(), pending.clone());
            let (error_out, error_pending) = (out.clone(), pending.clone());
            let (close_out, close_pending) = (out, pending);
            let (on_value, on_error, on_close) =
                (Rc::new(on_value), Rc::new(on_error), Rc::new(on_close));

            upstream.subscribe(Handler::new(
                move |value| {
                    let (out, pending, on_value) =
                        (value_out.clone(), value_pending.clone(), on_value.clone());
                    async move { join(on_value(value)?, out, pending).await }
                },
                move |error| {
                    let (out, pending, on_error) =
                        (error_out.clone(), error_pending.clone(), on_error.clone());
                    async move { join(on_error(error)?, out, pending).await }
                },
                move || {
                    let (out, pending, on_close) =
                        (close_out.clone(), close_pending.clone(), on_close.clone());
                    async move {
                        join(on_close()?, out.clone(), pending.clone()).await?;
                        settle(&pending, &out).await
                    }
                },
            ));

            async move { upstream.run().await }
        })
    }

    /// Flat-maps every value through `f`; errors pass through.
    pub fn chain<F>(&self, f: F) -> Stream
    where
        F: Fn(Value) -> Result<Stream> + 'static,
    {
        self.match_with("chain", f, |error| Ok(Stream::error(error)), || Ok(Stream::empty()))
    }

    pub fn map<F>(&self, f: F) -> Stream
    where
        F: Fn(Value) -> Result<Value> + 'static,
    {
        self.match_with(
            "map",
            move |value| Ok(Stream::of(f(value)?)),
            |error| Ok(Stream::error(error)),
            || Ok(Stream::empty()),
        )
    }

    /// Replaces every error with the stream `f` returns for it.
    pub fn or_else<F>(&self, f: F) -> Stream
    where
        F: Fn(Value) -> Result<Stream> + 'static,
    {
        self.match_with("or-else", |value| Ok(Stream::of(value)), f, || Ok(Stream::empty()))
    }

    pub fn map_error<F>(&self, f: F) -> Stream
    where
        F: Fn(Value) -> Result<Value> + 'static,
    {
        self.match_with(
            "map-error",
            |value| Ok(Stream::of(value)),
            move |error| Ok(Stream::error(f(error)?)),
            || Ok(Stream::empty()),
        )
    }

    pub fn bimap<V, E>(&self, on_value: V, on_error: E) -> Stream
    where
        V: Fn(Value) -> Result<Value> + 'static,
        E: Fn(Value) -> Result<Value> + 'static,
    {
        self.match_with(
            "bimap",
            move |value| Ok(Stream::of(on_value(value)?)),
            move |error| Ok(Stream::error(on_error(error)?)),
            || Ok(Stream::empty()),
        )
    }

    /// Exchanges the value and error channels.
    pub fn swap(&self) -> Stream {
        self.match_with(
            "swap",
            |value| Ok(Stream::error(value)),
            |error| Ok(Stream::of(error)),
            || Ok(Stream::empty()),
        )
    }

    /// Plays this stream, then `other` if this one emitted no error.
    pub fn concat(&self, other: &Stream) -> Stream {
        let other = other.clone();
        let errored = Rc::new(Cell::new(false));
        let saw_error = errored.clone();
        self.match_with(
            "concat",
            |value| Ok(Stream::of(value)),
            move |error| {
                saw_error.set(true);
                Ok(Stream::error(error))
            },
            move || {
                if errored.get() {
                    Ok(Stream::empty())
                } else {
                    Ok(other.clone())
                }
            },
        )
    }

    pub fn filter<F>(&self, keep: F) -> Stream
    where
        F: Fn(&Value) -> Result<bool> + 'static,
    {
        self.match_with(
            "filter",
            move |value| {
                if keep(&value)? {
                    Ok(Stream::of(value))
                } else {
                    Ok(Stream::empty())
                }
            },
            |error| Ok(Stream::error(error)),
            || Ok(Stream::empty()),
        )
    }

    /// Calls `f` on each value before passing it along unchanged.
    pub fn tap<F>(&self, f: F) -> Stream
    where
        F: Fn(&Value) -> Result<()> + 'static,
    {
        self.match_with(
            "tap",
            move |value| {
                f(&value)?;
                Ok(Stream::of(value))
            },
            |error| Ok(Stream::error(error)),
            || Ok(Stream::empty()),
        )
    }

    /// Runs both streams concurrently. Closes once both have closed.
    pub fn merge(&self, other: &Stream) -> Stream {
        let (left, right) = (self.clone(), other.clone());
        Stream::from_fn("merge", move |out: Emitter| async move {
            let pending = Rc::new(Cell::new(2usize));
            for input in [&left, &right] {
                let (on_value, on_error, on_close) = (out.clone(), out.clone(), out.clone());
                let pending = pending.clone();
                input.subscribe(Handler::new(
                    move |value| {
                        let out = on_value.clone();
                        async move { out.value(value).await }
                    },
                    move |error| {
                        let out = on_error.clone();
                        async move { out.error(error).await }
                    },
                    move || {
                        let (out, pending) = (on_close.clone(), pending.clone());
                        async move { settle(&pending, &out).await }
                    },
                ));
            }
            tokio::try_join!(left.run(), right.run()).map(|_| ())
        })
    }

    /// Accumulates values; emits the total once the upstream closes.
    /// Errors are forwarded without touching the accumulator.
    pub fn fold<F>(&self, initial: Value, combine: F) -> Stream
    where
        F: Fn(Value, Value) -> Result<Value> + 'static,
    {
        let upstream = self.clone();
        Stream::from_fn("fold", move |out: Emitter| {
            let total = Rc::new(RefCell::new(initial));
            let (accumulate, result) = (total.clone(), total);
            let (on_error, on_close) = (out.clone(), out);

            upstream.subscribe(Handler::new(
                move |value| {
                    let current = accumulate.borrow().clone();
                    let outcome = combine(current, value).map(|next| {
                        *accumulate.borrow_mut() = next;
                    });
                    ready(outcome)
                },
                move |error| {
                    let out = on_error.clone();
                    async move { out.error(error).await }
                },
                move || {
                    let (out, value) = (on_close.clone(), result.borrow().clone());
                    async move {
                        out.value(value).await?;
                        out.close().await
                    }
                },
            ));

            async move { upstream.run().await }
        })
    }

    /// Forwards the first `n` values, then closes.
    pub fn take(&self, n: usize) -> Stream {
        let upstream = self.clone();
        Stream::from_fn("take", move |out: Emitter| async move {
            if n == 0 {
                return out.close().await;
            }

            let remaining = Rc::new(Cell::new(n));
            let (on_value, on_error, on_close) = (out.clone(), out.clone(), out);
            upstream.subscribe(Handler::new(
                move |value| {
                    let (out, remaining) = (on_value.clone(), remaining.clone());
                    async move {
                        if remaining.get() == 0 {
                            return Ok(());
                        }
                        remaining.set(remaining.get() - 1);
                        out.value(value).await?;
                        if remaining.get() == 0 {
                            out.close().await
                        } else {
                            Ok(())
                        }
                    }
                },
                move |error| {
                    let out = on_error.clone();
                    async move { out.error(error).await }
                },
                move || {
                    let out = on_close.clone();
                    async move { out.close().await }
                },
            ));
            upstream.run().await
        })
    }

    /// Skips the first `n` values.
    pub fn drop(&self, n: usize) -> Stream {
        let skipped = Rc::new(Cell::new(0usize));
        self.match_with(
            "drop",
            move |value| {
                if skipped.get() < n {
                    skipped.set(skipped.get() + 1);
                    Ok(Stream::empty())
                } else {
                    Ok(Stream::of(value))
                }
            },
            |error| Ok(Stream::error(error)),
            || Ok(Stream::empty()),
        )
    }

    /// Ignores this stream's values and continues with `next()` once it
    /// closes. If this stream emitted an error, the error is forwarded and
    /// `next` never runs.
    pub fn and_then<F>(&self, next: F) -> Stream
    where
        F: Fn() -> Result<Stream> + 'static,
    {
        let upstream = self.clone();
        Stream::from_fn("and-then", move |out: Emitter| {
            let errored = Rc::new(Cell::new(false));
            let saw_error = errored.clone();
            let (on_error, on_close) = (out.clone(), out);

            upstream.subscribe(Handler::new(
                |_| ready(Ok(())),
                move |error| {
                    saw_error.set(true);
                    let out = on_error.clone();
                    async move { out.error(error).await }
                },
                move || {
                    let out = on_close.clone();
                    let continuation = if errored.get() { None } else { Some(next()) };
                    async move {
                        match continuation {
                            None => out.close().await,
                            Some(stream) => {
                                let stream = stream?;
                                stream.subscribe(Handler::relay(&out));
                                stream.run().await
                            }
                        }
                    }
                },
            ));

            async move { upstream.run().await }
        })
    }
}

/// Runs `stream`, re-emitting its events on `out` and counting it as
/// pending until it closes.
async fn join(stream: Stream, out: Emitter, pending: Rc<Cell<usize>>) -> Result<()> {
    pending.set(pending.get() + 1);
    let (on_value, on_error, on_close) = (out.clone(), out.clone(), out);
    stream.subscribe(Handler::new(
        move |value| {
            let out = on_value.clone();
            async move { out.value(value).await }
        },
        move |error| {
            let out = on_error.clone();
            async move { out.error(error).await }
        },
        move || {
            let (out, pending) = (on_close.clone(), pending.clone());
            async move { settle(&pending, &out).await }
        },
    ));
    stream.run().await
}

/// Marks one pending stream as closed, closing `out` after the last one.
async fn settle(pending: &Cell<usize>, out: &Emitter) -> Result<()> {
    let left = pending.get().saturating_sub(1);
    pending.set(left);
    if left == 0 {
        out.close().await
    } else {
        Ok(())
    }
}
