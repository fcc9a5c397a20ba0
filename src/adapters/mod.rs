// Adapters layer: concrete implementations of the domain ports for external systems.

pub mod chrome;

pub use chrome::{ChromeLauncher, ChromeSession};
