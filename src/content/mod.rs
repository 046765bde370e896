//! Exercise and feedback generation on top of the hybrid dispatcher
//!
//! Every generator absorbs dispatcher failures into a typed fallback:
//! free text becomes an `Error: ...` line, question sets become empty and
//! essay grading returns a zero-score grade.

pub mod grammar;
pub mod reading;
pub mod similarity;
pub mod tutor;
pub mod writing;

use serde::Deserialize;

use crate::llm::HybridDispatcher;

pub use grammar::FillInBlankQuestion;
pub use reading::ReadingQuestion;
pub use similarity::{grade_fill_in_blank, similarity, AnswerGrade, CORRECT_THRESHOLD};
pub use writing::EssayGrade;

/// CEFR level used when the caller does not pick one
pub const DEFAULT_LEVEL: &str = "B1";

/// Generates TEF practice material through a shared dispatcher
pub struct ContentGenerator<'a> {
    dispatcher: &'a HybridDispatcher,
}

impl<'a> ContentGenerator<'a> {
    pub fn new(dispatcher: &'a HybridDispatcher) -> Self {
        Self { dispatcher }
    }

    /// "Connected: ..." or the no-provider notice
    pub async fn status(&self) -> String {
        self.dispatcher.status().await
    }
}

/// Models asked for an array sometimes wrap it in an object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuestionList<T> {
    Bare(Vec<T>),
    Wrapped { questions: Vec<T> },
}

impl<T> QuestionList<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            QuestionList::Bare(items) | QuestionList::Wrapped { questions: items } => items,
        }
    }
}
