//! Shared utilities for ocrportal integration tests.
//!
//! - `TestHarness`: temp media root, in-memory database and fake engines
//! - `fixtures`: PDF builders and the fake engine scripts

pub mod fixtures;
pub mod harness;

pub use fixtures::*;
pub use harness::TestHarness;
