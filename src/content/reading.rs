use super::{ContentGenerator, QuestionList};
use crate::llm::GenerationRequest;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const QUESTIONS_SYSTEM_PROMPT: &str = "Return ONLY a valid JSON array.";

/// Multiple-choice comprehension question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: String,
}

impl ReadingQuestion {
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_index).map(String::as_str)
    }

    fn is_well_formed(&self) -> bool {
        self.options.len() >= 2 && self.correct_index < self.options.len()
    }
}

impl ContentGenerator<'_> {
    /// Short French article at the given CEFR level
    pub async fn reading_article(&self, topic: &str, level: &str) -> String {
        let system = format!("Write clear, natural French at {} level.", level);
        let prompt = format!("Write a 200-word article in French about: {}.", topic);

        info!("📰 Writing {} article about {}", level, topic);
        let request = GenerationRequest::text(prompt).with_system(system).with_search(true);

        self.dispatcher.dispatch(&request).await.into_text()
    }

    /// Up to `count` MCQ questions about `article`; empty when generation fails
    pub async fn reading_questions(&self, article: &str, count: usize) -> Vec<ReadingQuestion> {
        let prompt = format!(
            "Create {} MCQ questions based on: \n{}\n\n\
             Format: [{{\"question\": \"...\", \"options\": [\"A)...\", \"B)...\", \"C)...\", \"D)...\"], \"correct_index\": 0, \"explanation\": \"...\"}}]",
            count, article
        );

        let request = GenerationRequest::json(prompt).with_system(QUESTIONS_SYSTEM_PROMPT);

        match self
            .dispatcher
            .dispatch_json::<QuestionList<ReadingQuestion>>(&request)
            .await
        {
            Ok(list) => {
                let generated = list.into_vec();
                let total = generated.len();
                let mut questions: Vec<ReadingQuestion> =
                    generated.into_iter().filter(ReadingQuestion::is_well_formed).collect();
                if questions.len() < total {
                    debug!("Dropped {} malformed reading question(s)", total - questions.len());
                }
                questions.truncate(count);
                questions
            }
            Err(e) => {
                warn!("Could not generate reading questions: {}", e);
                Vec::new()
            }
        }
    }
}
