//! Shared test utilities for aegis integration tests.
//!
//! - `Seed` for a database pre-populated with an operator, a category and
//!   a few recipients
//! - `JobBuilder` for assembling job records without boilerplate

pub mod builders;

pub use builders::*;
