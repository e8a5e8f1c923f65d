//! Shared plumbing for otpgate services: config loading, tracing setup,
//! health endpoints, request-id middleware and serde helpers.

pub mod config;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
