//! CLI command implementations.

mod manuscript;
mod serve;
mod token;
mod transcribe;

pub use manuscript::run_manuscript;
pub use serve::run_serve;
pub use token::run_token;
pub use transcribe::run_transcribe;
