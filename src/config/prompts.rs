//! Prompt templates for Tolk.
//!
//! The merge and manuscript prompts are fixed instructions; the user-side
//! templates carry `{{variable}}` placeholders filled in at call time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    /// Prompts for reconciling two transcripts of the same audio.
    pub merge: MergePrompts,
    /// Prompts for synthetic case manuscript generation.
    pub manuscript: ManuscriptPrompts,
}

/// Prompts for transcript reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergePrompts {
    pub system: String,
    pub user: String,
}

impl Default for MergePrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an expert assistant tasked with creating a single, high-quality transcript from two different sources.
Your goal is to produce the most accurate and coherent final version.
- Analyze both the Whisper transcript and the clinical-service transcript.
- Where they agree, use that text.
- Where they disagree, use your best judgment to determine the most likely correct phrasing.
- If you are still uncertain about a sentence because of a significant disagreement, mark it as uncertain.
- For uncertain sentences, list the specific words you doubt; every listed word must appear verbatim in the sentence text.
- Judge which source transcript handled medical terminology better and which handled everyday speech better.
- Combine the results into a single, logical transcript structured as a list of sentences."#
                .to_string(),

            user: r#"Here are the two transcripts to analyze:

<whisper_transcript>
{{whisper}}
</whisper_transcript>

<clinical_transcript>
{{clinical}}
</clinical_transcript>

Please generate the improved, structured transcript now."#
                .to_string(),
        }
    }
}

/// Prompts for manuscript generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManuscriptPrompts {
    pub system: String,
}

impl Default for ManuscriptPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a highly knowledgeable medical professional and a skilled writer. Your task is to generate a clear, concise, and informative manuscript on the given topic: "{{topic}}".

The manuscript should be written in realistic prose, as if a doctor were explaining the concept to a colleague or a medical student. It must be accurate and professionally toned.

The text should be written as if you are a doctor that has just had a consultation and is using a lot of prose. The goal is that we cover a lot of vocabulary in its right context, a lot of medical terms.
Make it more like a description of a concrete case, it is fine to imagine what the patients etc presented of symptoms etc, more than an encyclopedic article.

Make the manuscript exactly four sentences and start the first sentence with "The patient ...".

Please structure your response according to the provided JSON schema, including a title, the main prose, and a list of key takeaways."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Render a template, substituting `{{name}}` placeholders.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut out = template.to_string();
        for (name, value) in vars {
            out = out.replace(&format!("{{{{{}}}}}", name), value);
        }
        out
    }
}
