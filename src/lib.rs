pub mod adapters;
pub mod application;
pub mod domain;
pub mod infra;

// Test utilities (in-memory stores and app state builder)
#[cfg(test)]
pub mod test_utils;

// Re-exports for shorter use statements.
pub use application::*;
pub use domain::*;
