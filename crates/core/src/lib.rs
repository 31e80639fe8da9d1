//! Core types and shared functionality for dossier.
//!
//! This crate provides:
//! - The output record schema (profiles, failures, dataset rows)
//! - Batch checkpoints and the window scheduler
//! - SQLite-backed checkpoint store and result sink
//! - Unified error types
//! - Configuration structures

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod record;
pub mod schedule;
pub mod store;

pub use checkpoint::{BatchCheckpoint, CompletionRecord, CompletionStatus};
pub use config::{AppConfig, ConfigError, FetchMode};
pub use error::Error;
pub use record::{DatasetItem, Departments, ExtractionResult, FailureRecord, ProfileRecord};
pub use schedule::{BatchPlan, NextState, Scheduler};
pub use store::{KeyValueStore, ResultSink, StateDb};
