//! Configuration and dependency initialization.

mod dependencies;
mod stores;

pub use dependencies::{Dependencies, StartupOptions};
pub use stores::Stores;
