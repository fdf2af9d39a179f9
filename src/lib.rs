//! Stackscope
//!
//! Profile normalization for CPU/wall-clock profiling payloads captured
//! from mobile and backend runtimes (Android method tracing, iOS, Python
//! and Rust sampling profilers).
//!
//! A raw payload is decoded per platform, then derived two ways: a
//! speedscope-shaped visualization document, and per-thread call trees
//! with per-function self-time aggregation for downstream analysis.
//!
//! This crate provides the core implementation for the `stackscope` CLI
//! tool and is embedded by the ingestion service.

pub mod calltree;
pub mod classify;
pub mod commands;
pub mod output;
pub mod parser;
pub mod speedscope;
pub mod utils;
