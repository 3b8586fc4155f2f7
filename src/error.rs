//! Errors returned by waits.

use crate::signal::Interrupt;
use std::any::Any;
use thiserror::Error;

/// The ways waiting on a [`JoinHandle`] can fail.
///
/// A task failure and an interrupted wait are different kinds: the former is the task's own
/// error, the latter only says the caller stopped waiting.
///
/// [`JoinHandle`]: ../task/struct.JoinHandle.html
#[derive(Debug, Error, PartialEq)]
pub enum WaitError<E> {
    /// The task returned an error.
    #[error(transparent)]
    Failed(E),

    /// The signal fired before the task finished. The task keeps running.
    #[error(transparent)]
    Interrupted(#[from] Interrupt),

    /// The task panicked instead of returning.
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The outcome was already consumed by an earlier wait.
    #[error("task outcome was already taken")]
    Taken,
}

impl<E> WaitError<E> {
    /// Returns `true` if the wait was abandoned because of a signal.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, WaitError::Interrupted(_))
    }

    /// Returns `true` if the task itself returned an error.
    pub fn is_failed(&self) -> bool {
        matches!(self, WaitError::Failed(_))
    }

    /// Extracts the task's own error, if that is what this is.
    pub fn into_failed(self) -> Option<E> {
        match self {
            WaitError::Failed(err) => Some(err),
            _ => None,
        }
    }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<&'static str>() {
        Ok(msg) => (*msg).to_string(),
        Err(payload) => match payload.downcast::<String>() {
            Ok(msg) => *msg,
            Err(_) => "Box<dyn Any>".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{panic_message, WaitError};
    use crate::signal::Interrupt;
    use std::error::Error;
    use std::io;

    #[test]
    fn failed_is_transparent() {
        let err: WaitError<io::Error> =
            WaitError::Failed(io::Error::new(io::ErrorKind::Other, "some error"));
        assert_eq!("some error", err.to_string());
        assert!(err.is_failed());
        assert!(!err.is_interrupted());
        assert_eq!("some error", err.into_failed().unwrap().to_string());
    }

    #[test]
    fn interrupted_from_signal() {
        let err: WaitError<io::Error> = Interrupt::DeadlineExceeded.into();
        assert!(err.is_interrupted());
        assert_eq!(Interrupt::DeadlineExceeded.to_string(), err.to_string());
        assert!(err.source().is_none());
        assert!(err.into_failed().is_none());
    }

    #[test]
    fn panic_payloads() {
        assert_eq!("boom", panic_message(Box::new("boom")));
        assert_eq!("bang", panic_message(Box::new(String::from("bang"))));
        assert_eq!("Box<dyn Any>", panic_message(Box::new(42)));
    }
}
