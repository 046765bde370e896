use super::{ContentGenerator, QuestionList};
use crate::llm::GenerationRequest;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const GRAMMAR_SYSTEM_PROMPT: &str = "You are a French grammar expert preparing students for the TEF exam.";
const EXERCISE_SYSTEM_PROMPT: &str = "You are creating TEF-style grammar exercises. Return ONLY a valid JSON array.";

/// A single gap-fill exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillInBlankQuestion {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub explanation: String,
}

impl ContentGenerator<'_> {
    /// Practical explanation of a grammar point, grounded with web search
    pub async fn explain_grammar(&self, topic: &str) -> String {
        let prompt = format!(
            "Explain the French grammar topic: {}\n\
             Include:\n\
             1. Brief definition\n\
             2. When to use it\n\
             3. 2-3 concrete examples\n\
             Keep it practical and exam-focused.",
            topic
        );

        info!("📘 Explaining grammar topic: {}", topic);
        let request = GenerationRequest::text(prompt)
            .with_system(GRAMMAR_SYSTEM_PROMPT)
            .with_search(true);

        self.dispatcher.dispatch(&request).await.into_text()
    }

    /// Up to `count` gap-fill questions; empty when generation fails
    pub async fn fill_in_blank_questions(&self, topic: &str, count: usize) -> Vec<FillInBlankQuestion> {
        let prompt = format!(
            "Create {} fill-in-the-blank questions for: {}.\n\
             Mark the blank with ___.\n\
             Format as JSON array: [{{\"question\": \"...\", \"answer\": \"...\", \"explanation\": \"...\"}}]",
            count, topic
        );

        let request = GenerationRequest::json(prompt).with_system(EXERCISE_SYSTEM_PROMPT);

        match self
            .dispatcher
            .dispatch_json::<QuestionList<FillInBlankQuestion>>(&request)
            .await
        {
            Ok(list) => {
                let mut questions = list.into_vec();
                questions.truncate(count);
                info!("✏️ Generated {} fill-in-the-blank question(s) for {}", questions.len(), topic);
                questions
            }
            Err(e) => {
                warn!("Could not generate exercises for {}: {}", topic, e);
                Vec::new()
            }
        }
    }
}
