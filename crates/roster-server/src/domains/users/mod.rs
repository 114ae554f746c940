pub mod service;
#[cfg(test)]
mod tests;

pub use service::{ImagePolicy, UserWriteService};
