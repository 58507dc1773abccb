//! Transcript reconciliation and manuscript generation.
//!
//! Takes the two independently produced transcripts of the same audio and
//! asks an LLM for a single sentence-structured version with uncertainty and
//! terminology annotations. The model output is constrained by a JSON schema
//! and post-validated before it is handed to callers.

mod engine;

pub use engine::OpenAiReconciler;

use crate::error::{Result, TolkError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which source transcript handled a category of speech better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceVerdict {
    Whisper,
    Clinical,
    Tie,
}

/// A single sentence of the reconciled transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    /// The corrected and finalized sentence.
    pub text: String,
    /// True when the two sources disagreed significantly here.
    pub is_uncertain: bool,
    /// True when the sentence contains specialist medical terminology.
    pub has_medical_terminology: bool,
    /// Verbatim words from `text` the model doubts. Only meaningful when
    /// `is_uncertain` is set.
    pub uncertain_words: Vec<String>,
}

/// The reconciled transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedTranscript {
    /// Ordered sentences of the final transcript.
    pub sentences: Vec<Sentence>,
    /// Which source was better for medical terms.
    pub medical_term_source: SourceVerdict,
    /// Which source was better for everyday speech.
    pub everyday_speech_source: SourceVerdict,
}

/// A structured synthetic case manuscript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manuscript {
    /// A concise and fitting title.
    pub title: String,
    /// The main body, written as case prose.
    pub prose: String,
    /// 3-5 bullet points summarizing the prose.
    pub key_takeaways: Vec<String>,
}

/// Trait for LLM-backed reconciliation services.
#[async_trait]
pub trait Reconciler: Send + Sync {
    /// Reconcile a Whisper and a clinical transcript of the same audio.
    async fn merge(&self, whisper_text: &str, clinical_text: &str) -> Result<MergedTranscript>;

    /// Generate a synthetic case manuscript on a topic.
    async fn manuscript(&self, topic: &str) -> Result<Manuscript>;
}

/// Validate a parsed merge result.
///
/// Every uncertain word must be a verbatim substring of its sentence's text;
/// anything else means the model violated the contract and the result is
/// rejected rather than silently passed on. No retry follows.
pub fn validate_merged(merged: &MergedTranscript) -> Result<()> {
    if merged.sentences.is_empty() {
        return Err(TolkError::Merge(
            "model returned a transcript with no sentences".to_string(),
        ));
    }
    for (idx, sentence) in merged.sentences.iter().enumerate() {
        for word in &sentence.uncertain_words {
            if !sentence.text.contains(word.as_str()) {
                return Err(TolkError::Merge(format!(
                    "sentence {}: uncertain word {:?} is not a substring of the sentence text",
                    idx, word
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(text: &str, uncertain: bool, words: &[&str]) -> Sentence {
        Sentence {
            text: text.to_string(),
            is_uncertain: uncertain,
            has_medical_terminology: false,
            uncertain_words: words.iter().map(|w| w.to_string()).collect(),
        }
    }

    fn merged(sentences: Vec<Sentence>) -> MergedTranscript {
        MergedTranscript {
            sentences,
            medical_term_source: SourceVerdict::Clinical,
            everyday_speech_source: SourceVerdict::Whisper,
        }
    }

    #[test]
    fn test_valid_merge_passes() {
        let m = merged(vec![
            sentence("Patienten har pneumoni.", true, &["pneumoni"]),
            sentence("Det går fint.", false, &[]),
        ]);
        assert!(validate_merged(&m).is_ok());
    }

    #[test]
    fn test_non_substring_uncertain_word_is_rejected() {
        let m = merged(vec![sentence("Patienten har pneumoni.", true, &["bronkitis"])]);
        let err = validate_merged(&m).unwrap_err();
        assert!(matches!(err, TolkError::Merge(_)));
        assert!(err.to_string().contains("bronkitis"));
    }

    #[test]
    fn test_empty_sentence_list_is_rejected() {
        let m = merged(vec![]);
        assert!(validate_merged(&m).is_err());
    }

    #[test]
    fn test_verdict_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SourceVerdict::Whisper).unwrap(),
            "\"whisper\""
        );
        let v: SourceVerdict = serde_json::from_str("\"tie\"").unwrap();
        assert_eq!(v, SourceVerdict::Tie);
    }
}
