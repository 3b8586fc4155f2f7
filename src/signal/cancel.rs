use super::Interrupt;
use parking_lot::Mutex;
use slab::Slab;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

#[derive(Debug, Default)]
struct Inner {
    canceled: AtomicBool,
    wakers: Mutex<Slab<Waker>>,
}

/// A cloneable source of [`Interrupt::Canceled`].
///
/// All clones share one state; canceling any of them fires every [`OnCancel`] created from
/// any clone. Canceling is permanent.
///
/// [`Interrupt::Canceled`]: enum.Interrupt.html#variant.Canceled
/// [`OnCancel`]: struct.OnCancel.html
///
/// # Examples
///
/// ```
/// use spawn_handle::signal::CancelToken;
/// use spawn_handle::task;
/// use std::thread;
/// use std::time::Duration;
///
/// let token = CancelToken::new();
/// let mut handle = task::spawn(|| {
///     thread::sleep(Duration::from_secs(3600));
///     Ok::<_, std::io::Error>(())
/// });
///
/// let canceler = token.clone();
/// thread::spawn(move || canceler.cancel());
///
/// let err = handle.wait_with(token.canceled()).unwrap_err();
/// assert!(err.is_interrupted());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    /// Creates a token that is not canceled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the token and wakes everything waiting on it. Calling it again does nothing.
    pub fn cancel(&self) {
        if self.inner.canceled.swap(true, Ordering::AcqRel) {
            return;
        }
        for (_, waker) in self.inner.wakers.lock().iter() {
            waker.wake_by_ref();
        }
    }

    /// Whether [`cancel`](#method.cancel) has been called on any clone.
    #[inline]
    pub fn is_canceled(&self) -> bool {
        self.inner.canceled.load(Ordering::Acquire)
    }

    /// A signal that fires once the token is canceled.
    pub fn canceled(&self) -> OnCancel {
        OnCancel {
            token: self.clone(),
            key: None,
        }
    }
}

/// The signal returned by [`CancelToken::canceled`].
///
/// [`CancelToken::canceled`]: struct.CancelToken.html#method.canceled
#[derive(Debug)]
pub struct OnCancel {
    token: CancelToken,
    key: Option<usize>,
}

impl Future for OnCancel {
    type Output = Interrupt;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.token.is_canceled() {
            return Poll::Ready(Interrupt::Canceled);
        }

        let this = &mut *self;
        {
            let mut wakers = this.token.inner.wakers.lock();
            match this.key {
                Some(key) => {
                    if !wakers[key].will_wake(cx.waker()) {
                        wakers[key] = cx.waker().clone();
                    }
                }
                None => this.key = Some(wakers.insert(cx.waker().clone())),
            }
        }

        // `cancel` may have run between the first check and the registration.
        if this.token.is_canceled() {
            Poll::Ready(Interrupt::Canceled)
        } else {
            Poll::Pending
        }
    }
}

impl Drop for OnCancel {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.token.inner.wakers.lock().remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CancelToken;
    use crate::signal::Interrupt;
    use crate::task::block_on;
    use futures::FutureExt;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn pending_until_canceled() {
        let token = CancelToken::new();
        assert!(!token.is_canceled());
        assert!(token.canceled().now_or_never().is_none());

        token.cancel();
        assert!(token.is_canceled());
        assert_eq!(Some(Interrupt::Canceled), token.canceled().now_or_never());
    }

    #[test]
    fn cancel_is_idempotent() {
        let token = CancelToken::new();
        token.cancel();
        token.cancel();
        assert!(token.clone().is_canceled());
    }

    #[test]
    fn wakes_blocked_waiter() {
        let token = CancelToken::new();
        let canceler = token.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            canceler.cancel();
        });
        assert_eq!(Interrupt::Canceled, block_on(token.canceled()));
    }

    #[test]
    fn dropped_signal_unregisters() {
        let token = CancelToken::new();
        let mut on_cancel = token.canceled();
        assert!((&mut on_cancel).now_or_never().is_none());
        assert_eq!(1, token.inner.wakers.lock().len());
        drop(on_cancel);
        assert!(token.inner.wakers.lock().is_empty());
    }
}
