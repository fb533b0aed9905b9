//! HTTP request handlers.
//!
//! Handlers are thin wrappers that delegate to the `GenerationService`.

pub mod generate;
pub mod images;
pub mod meta;
