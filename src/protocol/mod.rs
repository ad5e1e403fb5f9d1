//! Wire protocol handling.
//!
//! The protocol is plain text: one command per newline-terminated record on
//! streams, one command per datagram on UDP. This module reassembles records
//! from raw stream bytes and parses each record into a command. Malformed
//! input always surfaces as an error value; it must never crash the broker
//! loop or desynchronize reassembly.

pub mod command;
pub mod framer;

pub use command::{Command, CommandError};
pub use framer::{FrameError, LineFramer};
