//! Push-based asynchronous streams.
//!
//! A [`Stream`] pairs a producer, run at most once, with a list of
//! listeners. Running the stream hands the producer an [`Emitter`]; every
//! value or error it pushes is delivered to each listener in subscription
//! order, and the producer does not resume until all of them have finished
//! handling it. That await is the only back-pressure in the system.
//!
//! Streams are `!Send`: they share state through `Rc` and run on a single
//! thread, interleaving cooperatively at each push.
//!
//! ## Run protocol
//!
//! - Pushes into one stream are delivered one at a time, in the order they
//!   were made, even when several producers share an [`Emitter`].
//! - `close` is broadcast at most once, after every push made before it.
//!   Pushes after it are ignored.
//! - A producer that finishes without closing is closed for it.
//! - Once a stream closes, its producer is dropped at the next suspension
//!   point, which is how `take` stops an unbounded upstream.
//! - A listener that fails aborts the run. The failure is returned from
//!   [`Stream::run`] and no further events are delivered.

mod combinators;

#[cfg(test)]
mod stream_test;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use ecow::EcoString;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, trace, warn};

use crate::errors::{Error, ErrorKind, Result};
use crate::values::Value;

/// A boxed, single-threaded future.
pub type LocalFuture<T> = Pin<Box<dyn Future<Output = T> + 'static>>;

type Callback = Rc<dyn Fn(Value) -> LocalFuture<Result<()>>>;
type CloseCallback = Rc<dyn Fn() -> LocalFuture<Result<()>>>;
type Producer = Box<dyn FnOnce(Emitter) -> LocalFuture<Result<()>>>;

/// One listener: a callback per channel.
#[derive(Clone)]
pub struct Handler {
    value: Callback,
    error: Callback,
    close: CloseCallback,
}

impl Handler {
    pub fn new<V, VF, E, EF, C, CF>(value: V, error: E, close: C) -> Self
    where
        V: Fn(Value) -> VF + 'static,
        VF: Future<Output = Result<()>> + 'static,
        E: Fn(Value) -> EF + 'static,
        EF: Future<Output = Result<()>> + 'static,
        C: Fn() -> CF + 'static,
        CF: Future<Output = Result<()>> + 'static,
    {
        Self {
            value: Rc::new(move |v| -> LocalFuture<Result<()>> { Box::pin(value(v)) }),
            error: Rc::new(move |e| -> LocalFuture<Result<()>> { Box::pin(error(e)) }),
            close: Rc::new(move || -> LocalFuture<Result<()>> { Box::pin(close()) }),
        }
    }

    /// A handler that re-emits everything on `out`.
    pub fn relay(out: &Emitter) -> Self {
        let (on_value, on_error, on_close) = (out.clone(), out.clone(), out.clone());
        Handler::new(
            move |value| {
                let out = on_value.clone();
                async move { out.value(value).await }
            },
            move |error| {
                let out = on_error.clone();
                async move { out.error(error).await }
            },
            move || {
                let out = on_close.clone();
                async move { out.close().await }
            },
        )
    }
}

/// Identifies a subscription so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(usize);

/// Something a stream delivered, as recorded by [`Stream::collect`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Value(Value),
    Error(Value),
}

struct StreamInner {
    name: EcoString,
    producer: RefCell<Option<Producer>>,
    listeners: RefCell<Vec<(ListenerId, Handler)>>,
    next_listener: Cell<usize>,
    closed: Cell<bool>,
    failure: RefCell<Option<Error>>,
    closing: Notify,
    /// Held across each broadcast. The lock is fair, so deliveries follow
    /// the order of the pushes.
    delivery: Mutex<()>,
}

#[derive(Clone)]
pub struct Stream(Rc<StreamInner>);

impl Stream {
    /// A stream whose events come from `producer`, called once when the
    /// stream runs.
    pub fn from_fn<F, Fut>(name: impl Into<EcoString>, producer: F) -> Self
    where
        F: FnOnce(Emitter) -> Fut + 'static,
        Fut: Future<Output = Result<()>> + 'static,
    {
        let producer: Producer = Box::new(move |emitter: Emitter| -> LocalFuture<Result<()>> {
            Box::pin(producer(emitter))
        });
        Stream(Rc::new(StreamInner {
            name: name.into(),
            producer: RefCell::new(Some(producer)),
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
            closed: Cell::new(false),
            failure: RefCell::new(None),
            closing: Notify::new(),
            delivery: Mutex::new(()),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn ptr_eq(&self, other: &Stream) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Whether `run` has been called.
    pub fn is_running(&self) -> bool {
        self.0.producer.borrow().is_none()
    }

    pub fn is_closed(&self) -> bool {
        self.0.closed.get()
    }

    pub fn subscribe(&self, handler: Handler) -> ListenerId {
        let id = ListenerId(self.0.next_listener.get());
        self.0.next_listener.set(id.0 + 1);
        self.0.listeners.borrow_mut().push((id, handler));
        id
    }

    /// Removes a listener. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.0.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Runs the producer to completion.
    ///
    /// Resolves once the stream has closed, or with the first listener or
    /// producer failure. Running a stream twice is an error.
    pub fn run(&self) -> LocalFuture<Result<()>> {
        let stream = self.clone();
        Box::pin(async move {
            let producer = stream.0.producer.borrow_mut().take();
            let Some(producer) = producer else {
                return Err(Error::new(ErrorKind::StreamAlreadyRunning {
                    stream: stream.0.name.clone(),
                }));
            };

            debug!(stream = %stream.name(), "running stream");
            let emitter = Emitter(stream.clone());
            let production = producer(emitter.clone());
            let outcome = tokio::select! {
                biased;
                _ = stream.0.closing.notified() => Ok(()),
                outcome = production => outcome,
            };

            match outcome {
                Ok(()) if !stream.is_closed() => {
                    trace!(stream = %stream.name(), "producer finished without closing");
                    // A failed close has already been recorded below.
                    let _ = emitter.close().await;
                }
                Ok(()) => {}
                Err(error) => {
                    stream.fail(error);
                }
            }

            let failure = stream.0.failure.borrow_mut().take();
            match failure {
                Some(error) => {
                    warn!(stream = %stream.name(), error = %error, "stream failed");
                    Err(error)
                }
                None => {
                    debug!(stream = %stream.name(), "stream finished");
                    Ok(())
                }
            }
        })
    }

    /// Runs the stream, recording every value and error it emits.
    pub async fn collect(&self) -> Result<Vec<Event>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let (on_value, on_error) = (events.clone(), events.clone());
        self.subscribe(Handler::new(
            move |value| {
                on_value.borrow_mut().push(Event::Value(value));
                std::future::ready(Ok(()))
            },
            move |error| {
                on_error.borrow_mut().push(Event::Error(error));
                std::future::ready(Ok(()))
            },
            || std::future::ready(Ok(())),
        ));
        self.run().await?;
        let collected = std::mem::take(&mut *events.borrow_mut());
        Ok(collected)
    }

    fn listeners(&self) -> Vec<Handler> {
        self.0
            .listeners
            .borrow()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect()
    }

    /// Marks the run as failed and stops it. The first failure wins.
    fn fail(&self, error: Error) -> Error {
        {
            let mut failure = self.0.failure.borrow_mut();
            if failure.is_none() {
                *failure = Some(error.clone());
            }
        }
        self.0.closed.set(true);
        self.0.closing.notify_one();
        error
    }

    async fn broadcast(&self, event: Event) -> Result<()> {
        let _turn = self.0.delivery.lock().await;
        tokio::task::yield_now().await;
        if self.is_closed() {
            return Ok(());
        }
        for handler in self.listeners() {
            let delivery = match &event {
                Event::Value(value) => (handler.value)(value.clone()),
                Event::Error(error) => (handler.error)(error.clone()),
            };
            if let Err(error) = delivery.await {
                return Err(self.fail(error));
            }
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let _turn = self.0.delivery.lock().await;
        if self.0.closed.replace(true) {
            return Ok(());
        }
        for handler in self.listeners() {
            if let Err(error) = (handler.close)().await {
                return Err(self.fail(error));
            }
        }
        trace!(stream = %self.name(), "stream closed");
        self.0.closing.notify_one();
        Ok(())
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("name", &self.0.name)
            .field("running", &self.is_running())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// The operations a producer uses to push events into its stream.
#[derive(Clone)]
pub struct Emitter(Stream);

impl Emitter {
    /// Delivers a value to every listener.
    pub async fn value(&self, value: Value) -> Result<()> {
        self.0.broadcast(Event::Value(value)).await
    }

    /// Delivers an error to every listener. Errors do not end the stream.
    pub async fn error(&self, error: Value) -> Result<()> {
        self.0.broadcast(Event::Error(error)).await
    }

    /// Ends the stream. Closing twice is a no-op.
    pub async fn close(&self) -> Result<()> {
        self.0.close().await
    }

    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }

    pub fn stream_name(&self) -> &str {
        self.0.name()
    }
}
