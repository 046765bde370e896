use super::{ModuleType, ProgressStore};
use crate::config::GamificationConfig;
use anyhow::Result;
use tracing::{debug, info};

/// Activities that earn XP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    GrammarQuestion,
    ReadingQuestion,
    WritingSubmission,
    VoicePractice,
    SearchQuery,
}

impl Activity {
    pub fn xp(&self, config: &GamificationConfig) -> i64 {
        match self {
            Activity::GrammarQuestion => config.xp_per_grammar_question,
            Activity::ReadingQuestion => config.xp_per_reading_question,
            Activity::WritingSubmission => config.xp_per_writing_submission,
            Activity::VoicePractice => config.xp_per_voice_practice,
            Activity::SearchQuery => config.xp_per_search_query,
        }
    }

    /// Label stored in the XP history
    pub fn label(&self) -> &'static str {
        match self {
            Activity::GrammarQuestion => "grammar_question",
            Activity::ReadingQuestion => "reading_question",
            Activity::WritingSubmission => "writing_submission",
            Activity::VoicePractice => "voice_practice",
            Activity::SearchQuery => "search_query",
        }
    }
}

/// Record the configured XP for an activity and return the amount awarded
pub async fn award_activity_xp(store: &dyn ProgressStore, activity: Activity, config: &GamificationConfig) -> Result<i64> {
    let amount = activity.xp(config);
    store.add_xp(amount, activity.label()).await?;
    info!("⭐ +{} XP ({})", amount, activity.label());
    Ok(amount)
}

/// Award `xp` the first time `question_id` is answered.
///
/// Returns false, and leaves the store untouched, for a question that was
/// already completed.
pub async fn award_question_xp(
    store: &dyn ProgressStore,
    question_id: &str,
    week: u32,
    module: ModuleType,
    xp: i64,
) -> Result<bool> {
    if store.is_question_completed(question_id).await? {
        debug!("Question {} already completed, no XP", question_id);
        return Ok(false);
    }

    store.mark_question_completed(question_id, week, module).await?;
    store.add_xp(xp, &format!("{}_question", module)).await?;
    info!("⭐ +{} XP for question {}", xp, question_id);
    Ok(true)
}
