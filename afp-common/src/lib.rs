//! # AFP Common Library
//!
//! Shared code for the article fingerprinting workspace:
//! - Error and result types
//! - Configuration model, file resolution and loading

pub mod config;
pub mod error;

pub use config::{AfpConfig, ExtractorsConfig, LoggingConfig, PipelineConfig};
pub use error::{Error, Result};
