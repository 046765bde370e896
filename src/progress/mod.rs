//! Learner progress: XP history, streaks, module completion and favorites

pub mod gamification;
pub mod store;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use gamification::{award_activity_xp, award_question_xp, Activity};
pub use store::JsonProgressStore;

/// Weeks that are open without any prior progress
pub const ALWAYS_UNLOCKED_WEEKS: u32 = 3;

/// Exam skill a progress record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Grammar,
    Reading,
    Writing,
    Speaking,
}

impl ModuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::Grammar => "grammar",
            ModuleType::Reading => "reading",
            ModuleType::Writing => "writing",
            ModuleType::Speaking => "speaking",
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "grammar" => Ok(ModuleType::Grammar),
            "reading" => Ok(ModuleType::Reading),
            "writing" => Ok(ModuleType::Writing),
            "speaking" => Ok(ModuleType::Speaking),
            other => Err(anyhow::anyhow!("unknown module '{}'", other)),
        }
    }
}

/// One signed XP change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpEntry {
    pub amount: i64,
    pub activity: String,
    pub earned_at: DateTime<Local>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    pub current: u32,
    pub best: u32,
    pub last_activity: Option<NaiveDate>,
}

impl Streak {
    /// Streak after recording activity on `today`.
    ///
    /// Same day is a no-op, the following day extends the run and any
    /// longer gap restarts it at 1. Dates before the last activity are ignored.
    pub fn advanced(self, today: NaiveDate) -> Streak {
        let current = match self.last_activity {
            None => 1,
            Some(last) => match today.signed_duration_since(last).num_days() {
                0 => return self,
                1 => self.current + 1,
                d if d > 1 => 1,
                _ => return self,
            },
        };

        Streak {
            current,
            best: self.best.max(current),
            last_activity: Some(today),
        }
    }
}

/// Completion record for one (week, module) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleProgress {
    pub week: u32,
    pub module: ModuleType,
    pub completed: bool,
    pub score: Option<u32>,
    pub completed_at: DateTime<Local>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekProgress {
    pub grammar: bool,
    pub reading: bool,
    pub writing: bool,
    pub total_completed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedQuestion {
    pub question_id: String,
    pub week: u32,
    pub module: ModuleType,
    pub completed_at: DateTime<Local>,
}

/// Distinct earlier weeks with a completed module needed to open `week`
pub fn required_weeks_to_unlock(week: u32) -> usize {
    if week <= ALWAYS_UNLOCKED_WEEKS {
        0
    } else {
        ((week - ALWAYS_UNLOCKED_WEEKS) / 2).max(1) as usize
    }
}

/// Persistent learner state
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Record an XP change and count the activity toward the streak
    async fn add_xp(&self, amount: i64, activity: &str) -> Result<()>;

    async fn total_xp(&self) -> Result<i64>;

    /// XP earned since local midnight
    async fn daily_xp(&self) -> Result<i64>;

    /// Insert or replace the record for (week, module)
    async fn save_progress(&self, week: u32, module: ModuleType, completed: bool, score: Option<u32>) -> Result<()>;

    async fn week_progress(&self, week: u32) -> Result<WeekProgress>;

    async fn is_week_unlocked(&self, week: u32) -> Result<bool>;

    async fn update_streak(&self) -> Result<Streak>;

    async fn streak(&self) -> Result<Streak>;

    async fn add_favorite(&self, resource_id: &str) -> Result<()>;

    async fn remove_favorite(&self, resource_id: &str) -> Result<()>;

    async fn favorites(&self) -> Result<Vec<String>>;

    async fn is_favorite(&self, resource_id: &str) -> Result<bool>;

    async fn is_question_completed(&self, question_id: &str) -> Result<bool>;

    async fn mark_question_completed(&self, question_id: &str, week: u32, module: ModuleType) -> Result<()>;
}
