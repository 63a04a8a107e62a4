//! Ambient, cross-cutting utilities shared by the node runtime.
//!
//! This crate does not know anything about actors, ports, or brokers. It
//! provides the substrate every part of the runtime builds on: a common
//! error type, the message header / time-precision pair that every wire
//! message carries, and the logging setup.

pub mod errors;
pub mod logging;
pub mod time;

pub use errors::{SharedError, SharedResult};
pub use time::{Header, TimePrecision};
