//! CLI module for Tolk.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Tolk - Dual-Provider Medical Transcription
///
/// Transcribes consultation audio with a clinical speech service and Whisper,
/// and reconciles the two transcripts with an LLM.
/// The name "Tolk" comes from the Danish/Norwegian word for "interpreter."
#[derive(Parser, Debug)]
#[command(name = "tolk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP backend
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,
    },

    /// Transcribe one audio file with both providers and print the results
    Transcribe {
        /// Path to a local audio file
        file: String,

        /// Language hint (e.g. "da"); defaults to the configured language
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Acquire a bearer token from the clinical identity provider and print it
    Token,

    /// Generate a synthetic case manuscript on a topic
    Manuscript {
        /// The medical topic to write about
        topic: String,
    },
}
