//! Core domain types and utilities for the fabric-ops platform.
//!
//! This crate provides the foundational types, error handling, and shared
//! utilities used throughout the fabric-ops network operations console.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, RunId, WorkflowId};
