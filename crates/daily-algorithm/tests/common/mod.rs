//! Shared test utilities for the pipeline integration tests.
//!
//! This module provides:
//! - `TestHarness` with temp directories, an in-memory job store and fakes
//! - Recording fakes for every external service

pub mod fakes;
pub mod harness;

pub use fakes::*;
pub use harness::*;
