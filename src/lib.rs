#![warn(missing_docs)]
#![cfg_attr(not(test), deny(unsafe_code))]
#![doc = include_str!("../README.md")]

pub mod error;
pub mod signal;
pub mod task;

pub use error::WaitError;
pub use task::{spawn, Builder, JoinHandle};
