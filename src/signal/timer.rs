use super::Interrupt;
use futures_timer::Delay;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// A signal that fires with [`Interrupt::DeadlineExceeded`] once a point in time passes.
///
/// It might fire slightly later than requested but never earlier.
///
/// [`Interrupt::DeadlineExceeded`]: enum.Interrupt.html#variant.DeadlineExceeded
///
/// # Examples
///
/// ```
/// use spawn_handle::signal::{Deadline, Interrupt};
/// use spawn_handle::task;
/// use std::time::Duration;
///
/// let interrupt = task::block_on(Deadline::after(Duration::from_millis(10)));
/// assert_eq!(Interrupt::DeadlineExceeded, interrupt);
/// ```
#[derive(Debug)]
pub struct Deadline {
    delay: Delay,
}

impl Deadline {
    /// Fires after `dur` has elapsed.
    #[inline]
    pub fn after(dur: Duration) -> Self {
        Self {
            delay: Delay::new(dur),
        }
    }

    /// Fires at `instant`, or right away if it is already in the past.
    #[inline]
    pub fn at(instant: Instant) -> Self {
        Self::after(instant.saturating_duration_since(Instant::now()))
    }
}

impl Future for Deadline {
    type Output = Interrupt;

    #[inline]
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.delay)
            .poll(cx)
            .map(|()| Interrupt::DeadlineExceeded)
    }
}

#[cfg(test)]
mod tests {
    use super::Deadline;
    use crate::signal::Interrupt;
    use crate::task::block_on;
    use std::time::{Duration, Instant};

    #[test]
    fn after() {
        let gap = Duration::from_millis(50);
        let start = Instant::now();
        assert_eq!(Interrupt::DeadlineExceeded, block_on(Deadline::after(gap)));
        assert!(start.elapsed() >= gap);
    }

    #[test]
    fn at_in_the_past() {
        let past = Instant::now();
        std::thread::sleep(Duration::from_millis(5));
        let start = Instant::now();
        assert_eq!(Interrupt::DeadlineExceeded, block_on(Deadline::at(past)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
