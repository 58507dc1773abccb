//! Tolk - Dual-Provider Medical Transcription
//!
//! A clinical dictation backend that transcribes the same audio with two
//! independent providers and reconciles the results with an LLM.
//!
//! The name "Tolk" comes from the Danish/Norwegian word for "interpreter."
//!
//! # Overview
//!
//! Tolk allows you to:
//! - Transcribe consultation audio with a clinical speech service and Whisper
//! - Reconcile the two transcripts into a structured, sentence-level document
//!   with uncertainty and terminology annotations
//! - Run a small HTTP backend that queues transcription jobs and stores the
//!   results in SQLite
//! - Generate synthetic case manuscripts for vocabulary coverage
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `clinical` - Client for the clinical transcription service
//! - `transcription` - Generic speech-to-text (Whisper)
//! - `merge` - LLM transcript reconciliation and manuscript generation
//! - `store` - Job record persistence
//! - `pipeline` - Dual-transcription workflow coordination
//! - `cli` - Command-line interface and the `serve` HTTP server
//!
//! # Example
//!
//! ```rust,no_run
//! use tolk::config::Settings;
//! use tolk::pipeline::{Pipeline, TranscriptionPipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = TranscriptionPipeline::new(&settings)?;
//!
//!     let report = pipeline.run(std::path::Path::new("consult.wav"), Some("da")).await;
//!     if let Ok(text) = &report.whisper {
//!         println!("Whisper: {}", text);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod clinical;
pub mod config;
pub mod error;
pub mod merge;
pub mod openai;
pub mod pipeline;
pub mod store;
pub mod transcription;

pub use error::{Result, TolkError};
