//! Insight engine test suite.
//!
//! Exercises the pure parts of the pipeline (normalization, aggregation, data
//! gates and global cohort analysis) through the public library API. No
//! database is required.
//!
//! Run with: cargo test --test insight_engine

mod global_generation;
mod pattern_pipeline;
