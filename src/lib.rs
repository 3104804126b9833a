pub mod app;
pub mod browser;
pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod page;
pub mod selectors;
pub mod sink;

#[cfg(test)]
mod testing;

// Re-export key functions for convenience
pub use app::{init_tracing, run};
