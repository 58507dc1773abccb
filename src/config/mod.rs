//! Configuration module for Tolk.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ManuscriptPrompts, MergePrompts, Prompts};
pub use settings::{
    ClinicalSettings, DatabaseSettings, GeneralSettings, MergeSettings, ServerSettings,
    Settings, TranscriptionSettings,
};
