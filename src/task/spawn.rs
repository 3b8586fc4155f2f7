use super::JoinHandle;
use crate::error::{panic_message, WaitError};
use futures::channel::oneshot;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, trace};

const THREAD_NAME: &str = "spawn-handle/task";

// Raises the completion flag on every exit from the task thread, unwinding included, and
// always before the sender can be used or dropped.
struct Finished(Arc<AtomicBool>);

impl Drop for Finished {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Task factory, which can be used in order to configure the thread a task runs on.
///
/// Methods can be chained on it in order to configure it. The configured task is started
/// by [`spawn`](#method.spawn), which reports a failure to create the thread instead of
/// panicking like the free [`task::spawn`] does.
///
/// [`task::spawn`]: fn.spawn.html
///
/// # Examples
///
/// ```
/// use spawn_handle::task;
///
/// let handle = task::Builder::new()
///     .name("worker".into())
///     .stack_size(64 * 1024)
///     .spawn(|| Ok::<_, std::io::Error>(std::thread::current().name().map(String::from)))
///     .unwrap();
/// assert_eq!(Some("worker".to_string()), handle.wait().unwrap());
/// ```
#[derive(Debug, Default)]
pub struct Builder {
    name: Option<String>,
    stack_size: Option<usize>,
}

impl Builder {
    /// Creates a builder with the default thread name and the platform's stack size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names the task's thread.
    pub fn name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    /// Sets the stack size, in bytes, of the task's thread.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Starts `f` on a new thread and returns a handle to its outcome.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be created. Nothing runs in that case.
    pub fn spawn<F, T, E>(self, f: F) -> io::Result<JoinHandle<T, E>>
    where
        F: 'static + Send + FnOnce() -> Result<T, E>,
        T: 'static + Send,
        E: 'static + Send,
    {
        let (sender, receiver) = oneshot::channel();
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let name = self.name.unwrap_or_else(|| THREAD_NAME.to_string());
        let mut builder = thread::Builder::new().name(name.clone());
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }

        builder.spawn(move || {
            let finished = Finished(flag);
            let outcome = match catch_unwind(AssertUnwindSafe(f)) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(WaitError::Failed(err)),
                Err(payload) => Err(WaitError::Panicked(panic_message(payload))),
            };
            drop(finished);
            trace!(ok = outcome.is_ok(), "task finished");

            if sender.send(outcome).is_err() {
                debug!("join handle dropped, discarding task outcome");
            }
        })?;

        trace!(thread = %name, "spawned task");
        Ok(JoinHandle::new(receiver, finished))
    }
}

/// Spawns a task on its own thread.
///
/// The handle is returned right away, before `f` has necessarily started. `f` runs to
/// completion whether or not anyone waits on the handle; an outcome nobody collects is
/// dropped with the handle. A panic inside `f` is caught and reported to the waiter as
/// [`WaitError::Panicked`].
///
/// See also: [`Builder`], [`JoinHandle::wait`].
///
/// [`WaitError::Panicked`]: ../error/enum.WaitError.html#variant.Panicked
/// [`Builder`]: struct.Builder.html
/// [`JoinHandle::wait`]: struct.JoinHandle.html#method.wait
///
/// # Panics
///
/// Panics if the OS fails to create a thread; use [`Builder::spawn`] to recover from that.
///
/// [`Builder::spawn`]: struct.Builder.html#method.spawn
///
/// # Examples
///
/// Basic usage:
///
/// ```
/// use spawn_handle::task;
///
/// let handle = task::spawn(|| {
///     println!("long-running task here");
///     Ok::<_, std::io::Error>(1)
/// });
/// assert_eq!(1, handle.wait().unwrap());
/// ```
pub fn spawn<F, T, E>(f: F) -> JoinHandle<T, E>
where
    F: 'static + Send + FnOnce() -> Result<T, E>,
    T: 'static + Send,
    E: 'static + Send,
{
    Builder::new()
        .spawn(f)
        .expect("cannot start a task thread")
}
