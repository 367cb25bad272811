//! Data models for statements and pipeline configuration.

pub mod config;
pub mod statement;
