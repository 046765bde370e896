use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Similarity above which a non-identical answer still counts as correct
pub const CORRECT_THRESHOLD: f64 = 0.85;

/// Local verdict on a fill-in-the-blank answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerGrade {
    pub correct: bool,
    pub user_answer: String,
    pub correct_answer: String,
    pub similarity: f64,
}

/// Jaccard similarity of the two character sets, after trimming and lowercasing.
///
/// Identical strings score 1.0 and an empty side scores 0.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();

    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let left: HashSet<char> = a.chars().collect();
    let right: HashSet<char> = b.chars().collect();

    let shared = left.intersection(&right).count();
    let total = left.union(&right).count();

    shared as f64 / total as f64
}

/// Grade an answer without calling any AI backend
pub fn grade_fill_in_blank(user_answer: &str, correct_answer: &str) -> AnswerGrade {
    let score = similarity(user_answer, correct_answer);

    AnswerGrade {
        correct: score >= 1.0 || score > CORRECT_THRESHOLD,
        user_answer: user_answer.to_string(),
        correct_answer: correct_answer.to_string(),
        similarity: score,
    }
}
