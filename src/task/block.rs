use crate::signal::{self, Interrupt};
use crossbeam_utils::sync::{Parker, Unparker};
use futures::pin_mut;
use futures::task::{waker, ArcWake};
use std::cell::Cell;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

struct Unpark(Unparker);

impl ArcWake for Unpark {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.0.unpark()
    }
}

thread_local! {
    // One parker per waiting thread; the waker handed to polled futures unparks it.
    static PARKER: (Parker, Waker) = {
        let parker = Parker::new();
        let waker = waker(Arc::new(Unpark(parker.unparker().clone())));
        (parker, waker)
    };

    static BLOCKED: Cell<bool> = Cell::new(false);
}

/// Marks the current thread as blocked in the driver until dropped.
struct Blocked;

impl Blocked {
    fn enter() -> Self {
        if BLOCKED.with(|blocked| blocked.replace(true)) {
            panic!("recursively call `block_on`; await the handle instead")
        }
        Blocked
    }
}

impl Drop for Blocked {
    fn drop(&mut self) {
        BLOCKED.with(|blocked| blocked.set(false));
    }
}

/// Blocks the current thread until `fut` resolves or `signal` fires.
///
/// `fut` is polled first on every wake-up, so a future that is ready wins over a signal
/// that fired at the same time.
pub(crate) fn block_on_until<F, S>(fut: F, signal: S) -> Result<F::Output, Interrupt>
where
    F: Future,
    S: Future<Output = Interrupt>,
{
    let _blocked = Blocked::enter();
    pin_mut!(fut);
    pin_mut!(signal);
    PARKER.with(|(parker, waker)| {
        let mut cx = Context::from_waker(waker);
        loop {
            if let Poll::Ready(output) = fut.as_mut().poll(&mut cx) {
                return Ok(output);
            }
            if let Poll::Ready(interrupt) = signal.as_mut().poll(&mut cx) {
                return Err(interrupt);
            }
            parker.park();
        }
    })
}

/// Blocks the current thread until the future resolves.
///
/// The thread is parked while the future is pending and unparked by its waker, so a wait
/// costs no CPU. Every blocking wait on a [`JoinHandle`] goes through here.
///
/// [`JoinHandle`]: struct.JoinHandle.html
///
/// # Panics
///
/// Panics when called from inside another `block_on` on the same thread. Async code should
/// `.await` a handle rather than wait on it.
///
/// # Examples
///
/// ```
/// use spawn_handle::task;
///
/// let handle = task::spawn(|| Ok::<_, std::io::Error>(1));
/// let val = task::block_on(handle);
/// assert_eq!(1, val.unwrap());
/// ```
pub fn block_on<F>(fut: F) -> F::Output
where
    F: Future,
{
    match block_on_until(fut, signal::never()) {
        Ok(output) => output,
        Err(_) => unreachable!("`never` fired"),
    }
}

#[cfg(test)]
mod tests {
    use super::{block_on, block_on_until};
    use crate::signal::{self, CancelToken, Deadline, Interrupt};
    use futures::channel::oneshot;
    use std::thread;
    use std::time::Duration;

    #[test]
    #[should_panic]
    fn recursive_block_on() {
        block_on(async {
            block_on(async {});
        });
    }

    #[test]
    fn wakes_from_another_thread() {
        let (sender, receiver) = oneshot::channel();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            sender.send(7).unwrap();
        });
        assert_eq!(Ok(7), block_on(receiver));
    }

    #[test]
    fn can_block_again_after_return() {
        assert_eq!(1, block_on(async { 1 }));
        assert_eq!(2, block_on(async { 2 }));
    }

    #[test]
    fn ready_future_beats_fired_signal() {
        let token = CancelToken::new();
        token.cancel();
        assert_eq!(Ok(3), block_on_until(async { 3 }, token.canceled()));
    }

    #[test]
    fn signal_ends_pending_future() {
        let pending = futures::future::pending::<()>();
        assert_eq!(
            Err(Interrupt::DeadlineExceeded),
            block_on_until(pending, Deadline::after(Duration::from_millis(10)))
        );
    }

    #[test]
    fn never_leaves_future_alone() {
        assert_eq!(Ok(4), block_on_until(async { 4 }, signal::never()));
    }
}
