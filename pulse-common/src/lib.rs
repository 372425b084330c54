//! Shared types and utilities for the Pulse workspace.
//!
//! This crate holds the pieces every other crate needs without dragging in
//! heavy transitive dependencies: centralised tracing setup in
//! [`observability`] and the small cross-crate policy enums.
//!
//! # Examples
//!
//! ```rust
//! use pulse_common::TelemetryPolicy;
//!
//! let policy = TelemetryPolicy::default();
//! assert_eq!(policy, TelemetryPolicy::Fail);
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// What a fetcher does when a platform response carries no rate-limit
/// telemetry (missing remaining/reset headers or status fields).
///
/// `Fail` surfaces an explicit error so callers notice blind spots in
/// quota tracking; `SkipWait` proceeds without a wait and leaves the
/// decision to the caller's own pacing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryPolicy {
    #[default]
    Fail,
    SkipWait,
}
