//! Trait abstractions at the pipeline's seams.
//!
//! Applications (and tests) plug in storage access, acquisition strategies
//! and bookmark sources through these.

pub mod backend;
pub mod bookmarks;
pub mod strategy;
