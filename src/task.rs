//! Spawning tasks and waiting on them.

mod block;
mod spawn;

pub use block::block_on;
pub use spawn::{spawn, Builder};

use block::block_on_until;

use crate::error::WaitError;
use crate::signal::{self, Deadline, Interrupt};
use futures::channel::oneshot;
use futures::future::poll_fn;
use futures::task::{Context, Poll};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

type Outcome<T, E> = Result<T, WaitError<E>>;

/// An owned handle to the outcome of a task started by [`spawn`].
///
/// The outcome can be taken once: by a blocking [`wait`], by one of the bounded waits, or by
/// awaiting the handle. Dropping the handle detaches the task, which still runs to completion.
///
/// [`spawn`]: fn.spawn.html
/// [`wait`]: #method.wait
pub struct JoinHandle<T, E> {
    outcome: Option<oneshot::Receiver<Outcome<T, E>>>,
    finished: Arc<AtomicBool>,
}

impl<T, E> JoinHandle<T, E> {
    fn new(outcome: oneshot::Receiver<Outcome<T, E>>, finished: Arc<AtomicBool>) -> Self {
        Self {
            outcome: Some(outcome),
            finished,
        }
    }

    /// Blocks until the task finishes and returns its outcome.
    ///
    /// # Examples
    ///
    /// ```
    /// use spawn_handle::task;
    /// use spawn_handle::WaitError;
    ///
    /// let handle = task::spawn(|| Err::<i32, _>("some error"));
    /// assert_eq!(Err(WaitError::Failed("some error")), handle.wait());
    /// ```
    pub fn wait(mut self) -> Outcome<T, E> {
        self.wait_with(signal::never())
    }

    /// Blocks until the task finishes or `signal` fires, whichever comes first.
    ///
    /// If the signal wins, the result is [`WaitError::Interrupted`] and the outcome stays in
    /// the handle for a later wait. **The task is not stopped**: it keeps its thread until
    /// its closure returns. A task that should give up early has to watch a signal of its
    /// own, e.g. a clone of the same [`CancelToken`].
    ///
    /// When the task has already finished, its outcome is returned even if the signal has
    /// fired too.
    ///
    /// [`WaitError::Interrupted`]: ../error/enum.WaitError.html#variant.Interrupted
    /// [`CancelToken`]: ../signal/struct.CancelToken.html
    ///
    /// # Panics
    ///
    /// Panics when called from inside [`block_on`](fn.block_on.html). Async code should
    /// `.await` the handle instead.
    pub fn wait_with<S>(&mut self, signal: S) -> Outcome<T, E>
    where
        S: Future<Output = Interrupt>,
    {
        match block_on_until(poll_fn(|cx| self.poll_outcome(cx)), signal) {
            Ok(outcome) => outcome,
            Err(interrupt) => Err(WaitError::Interrupted(interrupt)),
        }
    }

    /// Blocks until the task finishes or `dur` elapses.
    ///
    /// # Examples
    ///
    /// ```
    /// use spawn_handle::signal::Interrupt;
    /// use spawn_handle::task;
    /// use spawn_handle::WaitError;
    /// use std::thread;
    /// use std::time::Duration;
    ///
    /// let mut handle = task::spawn(|| {
    ///     thread::sleep(Duration::from_millis(100));
    ///     Ok::<_, ()>(42)
    /// });
    /// assert_eq!(
    ///     Err(WaitError::Interrupted(Interrupt::DeadlineExceeded)),
    ///     handle.wait_timeout(Duration::from_millis(1)),
    /// );
    /// assert_eq!(Ok(42), handle.wait());
    /// ```
    #[inline]
    pub fn wait_timeout(&mut self, dur: Duration) -> Outcome<T, E> {
        self.wait_with(Deadline::after(dur))
    }

    /// Takes the outcome if the task has finished, without blocking.
    ///
    /// Returns `None` while the task is still running.
    pub fn try_wait(&mut self) -> Option<Outcome<T, E>> {
        let receiver = match self.outcome.as_mut() {
            Some(receiver) => receiver,
            None => return Some(Err(WaitError::Taken)),
        };
        let outcome = match receiver.try_recv() {
            Ok(None) => return None,
            Ok(Some(outcome)) => outcome,
            Err(oneshot::Canceled) => Err(lost()),
        };
        self.outcome = None;
        Some(outcome)
    }

    /// Whether the task's closure has returned.
    ///
    /// Never blocks and never consumes the outcome. Once `true` it stays `true`, including
    /// after the outcome was taken. Use it for polling; the value itself still comes from a
    /// wait.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    fn poll_outcome(&mut self, cx: &mut Context<'_>) -> Poll<Outcome<T, E>> {
        let receiver = match self.outcome.as_mut() {
            Some(receiver) => receiver,
            None => return Poll::Ready(Err(WaitError::Taken)),
        };
        let outcome = match Pin::new(receiver).poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Ok(outcome)) => outcome,
            Poll::Ready(Err(oneshot::Canceled)) => Err(lost()),
        };
        self.outcome = None;
        Poll::Ready(outcome)
    }
}

// The sender only goes away unsent if the task thread unwound past `catch_unwind`.
fn lost<E>() -> WaitError<E> {
    WaitError::Panicked("task exited without an outcome".to_string())
}

impl<T, E> Future for JoinHandle<T, E> {
    type Output = Outcome<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.poll_outcome(cx)
    }
}

impl<T, E> fmt::Debug for JoinHandle<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinHandle")
            .field("finished", &self.is_finished())
            .field("taken", &self.outcome.is_none())
            .finish()
    }
}
