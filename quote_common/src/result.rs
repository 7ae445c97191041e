//! Result type alias shared across the workspace.
//!
//! This module defines a convenient alias that defaults the error type to the
//! common `PipelineError`, so functions can simply return `Result<T>`.
use crate::error::PipelineError;

/// Workspace-wide `Result` alias with `PipelineError` as the default error.
pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
