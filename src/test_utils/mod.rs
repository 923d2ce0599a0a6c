//! Test utilities for integration testing.
//!
//! This module provides:
//! - Test data factories for creating valid test fixtures
//! - In-memory repository implementations for mocking the key-value store
//! - `TestAppStateBuilder` for HTTP-level route tests

mod app_state_builder;
mod factories;
mod store_mocks;

pub use app_state_builder::*;
pub use factories::*;
pub use store_mocks::*;
