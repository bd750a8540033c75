//! Cross-module tests against a simulated host.

pub mod helpers;
