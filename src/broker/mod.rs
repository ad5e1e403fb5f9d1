pub mod engine;
pub mod error;
pub mod message;
pub mod topic;

pub use engine::{Broker, DeliveryReport, Limits};
pub use error::RegistryError;

#[cfg(test)]
mod tests;
