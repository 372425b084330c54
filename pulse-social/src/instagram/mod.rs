//! Instagram Graph-style API integration.
//!
//! Submodules provide the client wrapper and strongly typed response
//! models. Rate telemetry arrives as `x-ratelimit-*` response headers, so
//! each fetch observes the quota it just consumed and suspends before
//! handing back the payload when the window is exhausted.
pub mod client;
pub mod types;

pub use client::InstagramApi;
