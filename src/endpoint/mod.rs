//! The `endpoint` module defines the representation of a delivery target in
//! the relay.
//!
//! It provides the `Endpoint` struct, which encapsulates the state the broker
//! holds for a single subscriber: a unique identifier and the channel for
//! sending published payloads to it. The broker never touches sockets
//! directly; the owning transport drains the channel.

pub mod handle;
pub use handle::{Endpoint, EndpointId};
