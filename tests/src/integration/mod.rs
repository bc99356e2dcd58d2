//! # Integration Tests
//!
//! End-to-end flows through `AuthorizationService` with the in-memory stores.

pub mod flows;
