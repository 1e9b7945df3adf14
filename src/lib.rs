//! pr-combine - combine open pull requests into a single PR
//!
//! Open PRs of each repository are filtered by branch name, labels and
//! optionally CI/approval status. When enough of them match, their head
//! branches are merged one by one into a working branch, which is then
//! promoted to the combined branch and opened as a single PR.
//!
//! The engine lives in [`combine`] and talks to GitHub only through the
//! [`platform::RestClient`] and [`platform::StatusSource`] traits.

pub mod auth;
pub mod combine;
pub mod config;
pub mod error;
pub mod platform;
pub mod repos;
pub mod stats;
pub mod types;

pub use error::{Error, Result};
