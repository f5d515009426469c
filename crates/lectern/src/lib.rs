//! Lectern - resilient LLM-backed document generation.
//!
//! Lectern turns a subject, topic and grade level into a structured
//! workbook by running a fixed sequence of model-backed stages, or into a
//! multi-part worksheet by walking a fallback chain of content providers
//! per content type.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lectern::{Lectern, JsonFileSink, WorkbookRequest};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lectern = Lectern::load(None)?;
//!     let request = WorkbookRequest::builder()
//!         .subject("Science")
//!         .topic("Photosynthesis")
//!         .grade_level("5")
//!         .build()?;
//!     let pipeline = lectern
//!         .generate_workbook(request, Arc::new(JsonFileSink::new("workbook.json")))
//!         .await?;
//!     println!("{:?}", pipeline.summary());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `lectern_error` - error taxonomy
//! - `lectern_core` - request, response and result types
//! - `lectern_interface` - adapter, provider, probe, prompt and sink traits
//! - `lectern_rate_limit` - clock, rate limiter, retry policy, request client, config
//! - `lectern_models` - model catalog, provider adapters, completion gateway
//! - `lectern_cache` - health cache
//! - `lectern_fallback` - fallback chains and the worksheet coordinator
//! - `lectern_pipeline` - stages and the pipeline engine
//!
//! This crate re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod runtime;
mod sink;
mod telemetry;

pub use runtime::Lectern;
pub use sink::{JsonFileSink, MemorySink};
pub use telemetry::init_tracing;

pub use lectern_cache::*;
pub use lectern_core::*;
pub use lectern_error::*;
pub use lectern_fallback::*;
pub use lectern_interface::*;
pub use lectern_models::*;
pub use lectern_pipeline::*;
pub use lectern_rate_limit::*;
