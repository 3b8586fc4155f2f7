//! Signals that bound a wait.
//!
//! A signal is any future resolving to an [`Interrupt`]. It only ever ends the *wait*: the
//! task it races against is not told and keeps running until its closure returns.

mod cancel;
mod timer;

pub use cancel::{CancelToken, OnCancel};
pub use timer::Deadline;

use futures::future::{self, Either, Pending};
use futures::pin_mut;
use std::future::Future;
use thiserror::Error;

/// Why a wait was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Interrupt {
    /// The wait was canceled explicitly.
    #[error("wait canceled")]
    Canceled,

    /// The wait's deadline passed.
    #[error("wait deadline exceeded")]
    DeadlineExceeded,
}

/// A signal that never fires.
#[inline]
pub fn never() -> Pending<Interrupt> {
    future::pending()
}

/// Resolves with whichever of the two signals fires first.
///
/// # Examples
///
/// ```
/// use spawn_handle::signal::{self, CancelToken, Deadline, Interrupt};
/// use spawn_handle::task;
/// use std::time::Duration;
///
/// let token = CancelToken::new();
/// let either = signal::any(token.canceled(), Deadline::after(Duration::from_millis(10)));
/// assert_eq!(Interrupt::DeadlineExceeded, task::block_on(either));
/// ```
pub async fn any<A, B>(a: A, b: B) -> Interrupt
where
    A: Future<Output = Interrupt>,
    B: Future<Output = Interrupt>,
{
    pin_mut!(a);
    pin_mut!(b);
    match future::select(a, b).await {
        Either::Left((interrupt, _)) | Either::Right((interrupt, _)) => interrupt,
    }
}

#[cfg(test)]
mod tests {
    use super::{any, never, CancelToken, Deadline, Interrupt};
    use crate::task::block_on;
    use futures::FutureExt;
    use std::time::Duration;

    #[test]
    fn never_stays_pending() {
        assert!(never().now_or_never().is_none());
    }

    #[test]
    fn any_takes_the_first() {
        let token = CancelToken::new();
        token.cancel();
        let first = any(Deadline::after(Duration::from_secs(3600)), token.canceled());
        assert_eq!(Interrupt::Canceled, block_on(first));
    }

    #[test]
    fn display() {
        assert_eq!("wait canceled", Interrupt::Canceled.to_string());
        assert_eq!(
            "wait deadline exceeded",
            Interrupt::DeadlineExceeded.to_string()
        );
    }
}
