//! The consumer side of a polling run.
use std::future::poll_fn;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures::stream::{FusedStream, Stream};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::config::Buffer;
use crate::error::PollError;

pub(crate) type Item = Result<u32, PollError>;

#[derive(Debug)]
pub(crate) enum Sender {
    Unbounded(mpsc::UnboundedSender<Item>),
    Bounded(mpsc::Sender<Item>),
}

impl Sender {
    /// Returns `false` once the receiving side is gone.
    pub(crate) async fn send(&self, item: Item) -> bool {
        match self {
            Sender::Unbounded(tx) => tx.send(item).is_ok(),
            Sender::Bounded(tx) => tx.send(item).await.is_ok(),
        }
    }
}

#[derive(Debug)]
enum Receiver {
    Unbounded(mpsc::UnboundedReceiver<Item>),
    Bounded(mpsc::Receiver<Item>),
}

impl Receiver {
    fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<Item>> {
        match self {
            Receiver::Unbounded(rx) => rx.poll_recv(cx),
            Receiver::Bounded(rx) => rx.poll_recv(cx),
        }
    }

    fn close(&mut self) {
        match self {
            Receiver::Unbounded(rx) => rx.close(),
            Receiver::Bounded(rx) => rx.close(),
        }
    }
}

pub(crate) fn channel(buffer: Buffer, token: CancellationToken) -> (Sender, PollStream) {
    let (tx, rx) = match buffer {
        Buffer::Unbounded => {
            let (tx, rx) = mpsc::unbounded_channel();
            (Sender::Unbounded(tx), Receiver::Unbounded(rx))
        }
        Buffer::Bounded(capacity) => {
            let (tx, rx) = mpsc::channel(capacity.get());
            (Sender::Bounded(tx), Receiver::Bounded(rx))
        }
    };

    let stream = PollStream {
        rx,
        _guard: token.clone().drop_guard(),
        token,
        done: false,
    };
    (tx, stream)
}

/// Ordered sequence of iteration indices produced by a [`PollingDriver`](crate::PollingDriver).
///
/// Yields `Ok(i)` for every emitted iteration, then ends. A policy failure is delivered
/// as a final `Err` item. After [`cancel`](crate::PollingDriver::cancel) the stream ends
/// cleanly and discards anything still buffered.
///
/// Dropping the stream cancels the run.
#[derive(Debug)]
pub struct PollStream {
    rx: Receiver,
    token: CancellationToken,
    _guard: DropGuard,
    done: bool,
}

impl PollStream {
    /// Waits for the next iteration index, or `None` once the run is over.
    pub async fn recv(&mut self) -> Option<Result<u32, PollError>> {
        poll_fn(|cx| self.poll_item(cx)).await
    }

    fn poll_item(&mut self, cx: &mut Context<'_>) -> Poll<Option<Item>> {
        if self.done {
            return Poll::Ready(None);
        }
        if self.token.is_cancelled() {
            self.finish();
            return Poll::Ready(None);
        }

        match ready!(self.rx.poll_recv(cx)) {
            Some(Ok(iteration)) => Poll::Ready(Some(Ok(iteration))),
            Some(Err(err)) => {
                self.finish();
                Poll::Ready(Some(Err(err)))
            }
            None => {
                self.done = true;
                Poll::Ready(None)
            }
        }
    }

    fn finish(&mut self) {
        self.done = true;
        self.rx.close();
    }
}

impl Stream for PollStream {
    type Item = Result<u32, PollError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_item(cx)
    }
}

impl FusedStream for PollStream {
    fn is_terminated(&self) -> bool {
        self.done
    }
}
