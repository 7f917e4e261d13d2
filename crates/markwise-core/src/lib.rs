//! markwise-core: Answer matching, scoring engine, and batch statistics.
//!
//! This crate defines the data model, text normalization, question matching,
//! scoring and aggregation logic that the rest of markwise builds on. Remote
//! scorer implementations live in `markwise-scorer`.

pub mod engine;
pub mod error;
pub mod index;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod report;
pub mod results;
pub mod scorer;
pub mod statistics;
pub mod traits;

#[cfg(test)]
mod test_support;
