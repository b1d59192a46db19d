//! Event delivery to the external alert queue.
//!
//! The judge publishes through the [`vigil_judge::EventSink`] seam; this
//! crate provides the Redis list-queue implementation (one list per
//! priority) and a discard sink for deployments with alarming disabled.

pub mod discard;
pub mod error;
pub mod queue;

pub use discard::DiscardSink;
pub use queue::RedisSink;
