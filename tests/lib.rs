//! Shared fixtures for the kxlink integration tests.

pub mod fixtures;
