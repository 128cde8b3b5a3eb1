//! Data types shared across the pipeline.

pub mod config;
pub mod entry;
pub mod filter;
pub mod resource;
