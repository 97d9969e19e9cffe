//! Integration test suite for newsdesk.
//!
//! These tests drive the pipeline end to end against scripted engines and
//! check what lands in the merged result and on disk.
//!
//! # Test Categories
//!
//! - `pipeline_e2e`: Full runs through `Pipeline::run`
//! - `engines`: Replay and command engine boundaries
//! - `persistence`: Result files and reloading
//!
//! No test contacts a language model or search provider.

mod fixtures;

mod persistence;
mod pipeline_e2e;
