//! Auth types shared by otpgate services.
//!
//! Provides the JWT claims payload and access-token validation.

pub mod token;
