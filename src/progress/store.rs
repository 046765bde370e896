use super::{
    required_weeks_to_unlock, CompletedQuestion, ModuleProgress, ModuleType, ProgressStore, Streak, WeekProgress,
    XpEntry,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Everything persisted for the learner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ProgressDocument {
    #[serde(default)]
    xp_history: Vec<XpEntry>,
    #[serde(default)]
    modules: Vec<ModuleProgress>,
    #[serde(default)]
    streak: Streak,
    #[serde(default)]
    favorites: BTreeSet<String>,
    #[serde(default)]
    completed_questions: BTreeMap<String, CompletedQuestion>,
}

/// Progress store backed by a single pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonProgressStore {
    path: PathBuf,
    document: Arc<RwLock<ProgressDocument>>,
}

impl JsonProgressStore {
    /// Open the store, reading the file if it already exists
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let document = if fs::try_exists(&path).await.unwrap_or(false) {
            let content = fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading progress file {}", path.display()))?;
            let document: ProgressDocument = serde_json::from_str(&content)
                .with_context(|| format!("parsing progress file {}", path.display()))?;
            info!(
                "📂 Loaded progress: {} XP entries, {} module records",
                document.xp_history.len(),
                document.modules.len()
            );
            document
        } else {
            debug!("No progress file at {}, starting fresh", path.display());
            ProgressDocument::default()
        };

        Ok(Self {
            path,
            document: Arc::new(RwLock::new(document)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the document to disk, creating the parent directory on first use
    async fn persist(&self, document: &ProgressDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_string_pretty(document)?;
        fs::write(&self.path, content)
            .await
            .with_context(|| format!("writing progress file {}", self.path.display()))?;

        debug!("💾 Progress saved to {}", self.path.display());
        Ok(())
    }

    pub async fn add_xp_at(&self, amount: i64, activity: &str, at: DateTime<Local>) -> Result<()> {
        let mut document = self.document.write().await;
        document.xp_history.push(XpEntry {
            amount,
            activity: activity.to_string(),
            earned_at: at,
        });
        document.streak = document.streak.advanced(at.date_naive());
        self.persist(&document).await
    }

    pub async fn daily_xp_on(&self, date: NaiveDate) -> Result<i64> {
        let document = self.document.read().await;
        Ok(document
            .xp_history
            .iter()
            .filter(|entry| entry.earned_at.date_naive() == date)
            .map(|entry| entry.amount)
            .sum())
    }

    pub async fn update_streak_on(&self, date: NaiveDate) -> Result<Streak> {
        let mut document = self.document.write().await;
        let advanced = document.streak.advanced(date);
        if advanced != document.streak {
            document.streak = advanced;
            self.persist(&document).await?;
        }
        Ok(advanced)
    }

    pub async fn save_progress_at(
        &self,
        week: u32,
        module: ModuleType,
        completed: bool,
        score: Option<u32>,
        at: DateTime<Local>,
    ) -> Result<()> {
        let record = ModuleProgress {
            week,
            module,
            completed,
            score,
            completed_at: at,
        };

        let mut document = self.document.write().await;
        match document
            .modules
            .iter_mut()
            .find(|p| p.week == week && p.module == module)
        {
            Some(existing) => *existing = record,
            None => document.modules.push(record),
        }
        self.persist(&document).await
    }
}

#[async_trait]
impl ProgressStore for JsonProgressStore {
    async fn add_xp(&self, amount: i64, activity: &str) -> Result<()> {
        self.add_xp_at(amount, activity, Local::now()).await
    }

    async fn total_xp(&self) -> Result<i64> {
        let document = self.document.read().await;
        Ok(document.xp_history.iter().map(|entry| entry.amount).sum())
    }

    async fn daily_xp(&self) -> Result<i64> {
        self.daily_xp_on(Local::now().date_naive()).await
    }

    async fn save_progress(&self, week: u32, module: ModuleType, completed: bool, score: Option<u32>) -> Result<()> {
        self.save_progress_at(week, module, completed, score, Local::now()).await
    }

    async fn week_progress(&self, week: u32) -> Result<WeekProgress> {
        let document = self.document.read().await;
        let done = |module: ModuleType| {
            document
                .modules
                .iter()
                .any(|p| p.week == week && p.module == module && p.completed)
        };

        Ok(WeekProgress {
            grammar: done(ModuleType::Grammar),
            reading: done(ModuleType::Reading),
            writing: done(ModuleType::Writing),
            total_completed: document
                .modules
                .iter()
                .filter(|p| p.week == week && p.completed)
                .count(),
        })
    }

    async fn is_week_unlocked(&self, week: u32) -> Result<bool> {
        let required = required_weeks_to_unlock(week);
        if required == 0 {
            return Ok(true);
        }

        let document = self.document.read().await;
        let weeks_with_progress: HashSet<u32> = document
            .modules
            .iter()
            .filter(|p| p.week < week && p.completed)
            .map(|p| p.week)
            .collect();

        Ok(weeks_with_progress.len() >= required)
    }

    async fn update_streak(&self) -> Result<Streak> {
        self.update_streak_on(Local::now().date_naive()).await
    }

    async fn streak(&self) -> Result<Streak> {
        Ok(self.document.read().await.streak)
    }

    async fn add_favorite(&self, resource_id: &str) -> Result<()> {
        let mut document = self.document.write().await;
        if document.favorites.insert(resource_id.to_string()) {
            self.persist(&document).await?;
        }
        Ok(())
    }

    async fn remove_favorite(&self, resource_id: &str) -> Result<()> {
        let mut document = self.document.write().await;
        if document.favorites.remove(resource_id) {
            self.persist(&document).await?;
        }
        Ok(())
    }

    async fn favorites(&self) -> Result<Vec<String>> {
        Ok(self.document.read().await.favorites.iter().cloned().collect())
    }

    async fn is_favorite(&self, resource_id: &str) -> Result<bool> {
        Ok(self.document.read().await.favorites.contains(resource_id))
    }

    async fn is_question_completed(&self, question_id: &str) -> Result<bool> {
        Ok(self
            .document
            .read()
            .await
            .completed_questions
            .contains_key(question_id))
    }

    async fn mark_question_completed(&self, question_id: &str, week: u32, module: ModuleType) -> Result<()> {
        let mut document = self.document.write().await;
        document.completed_questions.insert(
            question_id.to_string(),
            CompletedQuestion {
                question_id: question_id.to_string(),
                week,
                module,
                completed_at: Local::now(),
            },
        );
        self.persist(&document).await
    }
}
