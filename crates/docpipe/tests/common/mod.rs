//! Shared test utilities for docpipe integration tests.

pub mod harness;

pub use harness::TestHarness;
