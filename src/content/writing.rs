use super::ContentGenerator;
use crate::llm::GenerationRequest;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

const EXAMINER_SYSTEM_PROMPT: &str = "You are a TEF examiner. Return ONLY JSON.";

/// Highest score for each of the three marking sections
pub const SECTION_MAX: u32 = 150;

/// Highest total score
pub const TOTAL_MAX: u32 = SECTION_MAX * 3;

/// Examiner feedback on a written production task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EssayGrade {
    #[serde(deserialize_with = "lenient_score")]
    pub structure_score: u32,
    #[serde(deserialize_with = "lenient_score")]
    pub vocabulary_score: u32,
    #[serde(deserialize_with = "lenient_score")]
    pub grammar_score: u32,
    #[serde(deserialize_with = "lenient_score")]
    pub total_score: u32,
    #[serde(default)]
    pub structure_feedback: String,
    #[serde(default)]
    pub vocabulary_feedback: String,
    #[serde(default)]
    pub grammar_feedback: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScore {
    Whole(u64),
    Fractional(f64),
    Text(String),
}

/// Accept integer, float or numeric-string scores, rounded to the nearest point.
/// Negative values become 0.
fn lenient_score<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match RawScore::deserialize(deserializer)? {
        RawScore::Whole(n) => n as f64,
        RawScore::Fractional(f) => f,
        RawScore::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("score is not a number: {:?}", text)))?,
    };

    if !value.is_finite() {
        return Err(serde::de::Error::custom("score is not a finite number"));
    }

    Ok(value.round().clamp(0.0, u32::MAX as f64) as u32)
}

impl EssayGrade {
    /// Zero-score grade returned when no backend produced a usable answer
    pub fn fallback(reason: &str) -> Self {
        let feedback = format!("Error: {}", reason);
        Self {
            structure_score: 0,
            vocabulary_score: 0,
            grammar_score: 0,
            total_score: 0,
            structure_feedback: feedback.clone(),
            vocabulary_feedback: feedback.clone(),
            grammar_feedback: feedback,
            suggestions: vec!["AI Error".to_string()],
        }
    }

    /// Clamp each section to its maximum and keep the total equal to their sum
    pub fn normalized(mut self) -> Self {
        self.structure_score = self.structure_score.min(SECTION_MAX);
        self.vocabulary_score = self.vocabulary_score.min(SECTION_MAX);
        self.grammar_score = self.grammar_score.min(SECTION_MAX);

        self.total_score = self.structure_score + self.vocabulary_score + self.grammar_score;
        self
    }
}

impl ContentGenerator<'_> {
    /// Grade an essay for the given task type (e.g. "Section A - Fait divers")
    pub async fn grade_essay(&self, essay: &str, task_type: &str) -> EssayGrade {
        let prompt = format!(
            "Grade this essay for '{}'.\n\n\
             Essay:\n{}\n\n\
             Return JSON with structure_score (0-{max}), vocabulary_score (0-{max}), \
             grammar_score (0-{max}), total_score (0-{total}), structure_feedback, \
             vocabulary_feedback, grammar_feedback and suggestions (array of strings).",
            task_type,
            essay,
            max = SECTION_MAX,
            total = TOTAL_MAX
        );

        let request = GenerationRequest::json(prompt).with_system(EXAMINER_SYSTEM_PROMPT);

        match self.dispatcher.dispatch_json::<EssayGrade>(&request).await {
            Ok(grade) => {
                let grade = grade.normalized();
                info!("📝 Essay graded: {}/{}", grade.total_score, TOTAL_MAX);
                grade
            }
            Err(e) => {
                warn!("Essay grading failed: {}", e);
                EssayGrade::fallback(&e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grade(structure: u32, vocabulary: u32, grammar: u32, total: u32) -> EssayGrade {
        EssayGrade {
            structure_score: structure,
            vocabulary_score: vocabulary,
            grammar_score: grammar,
            total_score: total,
            structure_feedback: String::new(),
            vocabulary_feedback: String::new(),
            grammar_feedback: String::new(),
            suggestions: Vec::new(),
        }
    }

    #[test]
    fn test_sections_are_clamped() {
        let normalized = grade(200, 100, 90, 390).normalized();
        assert_eq!(normalized.structure_score, 150);
        assert_eq!(normalized.total_score, 340);
    }

    #[test]
    fn test_total_recomputed_when_inconsistent() {
        assert_eq!(grade(100, 100, 100, 999).normalized().total_score, 300);
        assert_eq!(grade(120, 110, 100, 330).normalized().total_score, 330);
    }

    #[test]
    fn test_fractional_and_string_scores_are_accepted() {
        let parsed: EssayGrade = serde_json::from_str(
            r#"{"structure_score": 120.5, "vocabulary_score": "98", "grammar_score": 101.2, "total_score": 319.7}"#,
        )
        .unwrap();
        assert_eq!(parsed.structure_score, 121);
        assert_eq!(parsed.vocabulary_score, 98);
        assert_eq!(parsed.grammar_score, 101);
        assert_eq!(parsed.normalized().total_score, 320);
    }

    #[test]
    fn test_negative_score_floors_at_zero() {
        let parsed: EssayGrade = serde_json::from_str(
            r#"{"structure_score": -5, "vocabulary_score": 0, "grammar_score": 10, "total_score": 5}"#,
        )
        .unwrap();
        assert_eq!(parsed.structure_score, 0);
        assert!(serde_json::from_str::<EssayGrade>(
            r#"{"structure_score": "lots", "vocabulary_score": 0, "grammar_score": 0, "total_score": 0}"#
        )
        .is_err());
    }

    #[test]
    fn test_fallback_has_every_field() {
        let fallback = EssayGrade::fallback("timeout");
        assert_eq!(fallback.total_score, 0);
        assert_eq!(fallback.structure_feedback, "Error: timeout");
        assert_eq!(fallback.grammar_feedback, "Error: timeout");
        assert_eq!(fallback.suggestions, vec!["AI Error".to_string()]);
    }
}
