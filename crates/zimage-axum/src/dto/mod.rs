//! Data Transfer Objects (DTOs) for the HTTP API contract.
//!
//! These types fix the JSON shapes independently of the core domain types.

pub mod generation;
pub mod meta;

pub use generation::{GenerateRequest, GenerateUrlResponse};
pub use meta::{ApiInfo, HealthResponse};
