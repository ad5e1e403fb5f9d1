//! The `utils` module provides shared utilities used across the `topicast`
//! application, such as logging setup.

pub mod logging;
