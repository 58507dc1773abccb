//! Generate a synthetic case manuscript from the terminal.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::Result;
use crate::merge::{OpenAiReconciler, Reconciler};

/// Generate and print a manuscript on the given topic.
pub async fn run_manuscript(topic: &str, settings: Settings) -> Result<()> {
    let reconciler =
        OpenAiReconciler::from_settings(&settings.merge).with_prompts(settings.prompts.clone());

    Output::info(&format!("Generating manuscript on: {}", topic));
    let doc = reconciler.manuscript(topic).await?;

    Output::header(&doc.title);
    println!("{}", doc.prose);
    println!();
    Output::info("Key takeaways:");
    for takeaway in &doc.key_takeaways {
        println!("  - {}", takeaway);
    }

    Ok(())
}
