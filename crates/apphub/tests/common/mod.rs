//! Shared test utilities for apphub integration tests.
//!
//! This module provides:
//! - `TestHarness` owning a temp directory and a file-backed store
//! - Builders for applications, archetypes, questionnaires and assessments

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
