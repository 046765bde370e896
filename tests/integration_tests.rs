//! End-to-end generator behaviour over scripted providers

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

use tef_master::content::ContentGenerator;
use tef_master::llm::{LLMError, LLMProvider, Result};
use tef_master::progress::{award_question_xp, JsonProgressStore, ModuleType, ProgressStore};
use tef_master::{HybridDispatcher, PolicyMode, SearchAugmenter, LLM};

/// Provider that replays canned replies and records what it was asked
struct ScriptedProvider {
    label: &'static str,
    available: bool,
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedProvider {
    fn new(label: &'static str, available: bool, replies: Vec<std::result::Result<&str, &str>>) -> Self {
        Self {
            label,
            available,
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            calls: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn down(label: &'static str) -> Self {
        Self::new(label, false, Vec::new())
    }

    fn next(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), system_prompt.to_string()));
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(e)) => Err(LLMError::Backend(e)),
            None => Err(LLMError::Backend("script exhausted".to_string())),
        }
    }
}

#[async_trait]
impl LLM for ScriptedProvider {
    fn name(&self) -> String {
        self.label.to_string()
    }

    fn provider_type(&self) -> LLMProvider {
        LLMProvider::Gemini
    }

    async fn probe_availability(&self) -> bool {
        self.available
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn generate_text(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        self.next(prompt, system_prompt)
    }

    async fn generate_structured(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        self.next(prompt, system_prompt)
    }
}

fn dispatcher(policy: PolicyMode, local: ScriptedProvider, cloud: ScriptedProvider) -> HybridDispatcher {
    HybridDispatcher::new(Box::new(local), Box::new(cloud), policy, SearchAugmenter::disabled())
}

#[tokio::test]
async fn fill_in_blank_questions_are_truncated_to_count() {
    let reply = r#"```json
[{"question":"Je ___ étudiant.","answer":"suis","explanation":"être"},
 {"question":"Tu ___ faim.","answer":"as","explanation":"avoir"},
 {"question":"Il ___ content.","answer":"est"}]
```"#;
    let dispatcher = dispatcher(
        PolicyMode::Local,
        ScriptedProvider::new("Local", true, vec![Ok(reply)]),
        ScriptedProvider::down("Cloud"),
    );
    let generator = ContentGenerator::new(&dispatcher);

    let questions = generator.fill_in_blank_questions("être et avoir", 2).await;
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].answer, "suis");
    assert_eq!(questions[1].explanation, "avoir");
}

#[tokio::test]
async fn fewer_questions_than_requested_are_returned_as_is() {
    let dispatcher = dispatcher(
        PolicyMode::Cloud,
        ScriptedProvider::down("Local"),
        ScriptedProvider::new(
            "Cloud",
            true,
            vec![Ok(r#"{"questions":[{"question":"Nous ___ partis.","answer":"sommes"}]}"#)],
        ),
    );
    let generator = ContentGenerator::new(&dispatcher);

    let questions = generator.fill_in_blank_questions("passé composé", 5).await;
    assert_eq!(questions.len(), 1);
    assert!(questions[0].explanation.is_empty());
}

#[tokio::test]
async fn question_generation_failure_yields_empty_set() {
    let dispatcher = dispatcher(
        PolicyMode::Auto,
        ScriptedProvider::new("Local", true, vec![Ok("Voici vos questions !")]),
        ScriptedProvider::new("Cloud", true, vec![Err("quota exceeded")]),
    );
    let generator = ContentGenerator::new(&dispatcher);

    assert!(generator.fill_in_blank_questions("subjonctif", 3).await.is_empty());
    assert!(generator.reading_questions("Un article.", 3).await.is_empty());
}

#[tokio::test]
async fn reading_questions_drop_out_of_range_answers() {
    let reply = r#"[
        {"question":"Qui parle ?","options":["A) Marie","B) Paul"],"correct_index":0,"explanation":"ligne 1"},
        {"question":"Où ?","options":["A) Paris","B) Lyon"],"correct_index":4,"explanation":""}
    ]"#;
    let local = ScriptedProvider::new("Local", true, vec![Ok(reply)]);
    let prompts = local.prompts.clone();
    let dispatcher = dispatcher(PolicyMode::Local, local, ScriptedProvider::down("Cloud"));
    let generator = ContentGenerator::new(&dispatcher);

    let questions = generator.reading_questions("Marie parle à Paul.", 5).await;
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].correct_option(), Some("A) Marie"));

    let (prompt, system) = prompts.lock().unwrap()[0].clone();
    assert!(prompt.contains("Marie parle à Paul."));
    assert_eq!(system, "Return ONLY a valid JSON array.");
}

#[tokio::test]
async fn malformed_essay_grade_falls_back_to_zero() {
    let dispatcher = dispatcher(
        PolicyMode::Local,
        ScriptedProvider::new("Local", true, vec![Ok("{\"structure_score\": \"excellent\"")]),
        ScriptedProvider::down("Cloud"),
    );
    let generator = ContentGenerator::new(&dispatcher);

    let grade = generator.grade_essay("Hier, un chien...", "Section A - Fait Divers").await;
    assert_eq!(grade.total_score, 0);
    assert_eq!(grade.structure_score, 0);
    assert!(grade.structure_feedback.starts_with("Error"));
    assert!(grade.vocabulary_feedback.starts_with("Error"));
    assert!(grade.grammar_feedback.starts_with("Error"));
    assert_eq!(grade.suggestions, vec!["AI Error".to_string()]);
}

#[tokio::test]
async fn essay_grade_is_normalized_and_includes_essay() {
    let reply = r#"{"structure_score":140,"vocabulary_score":170,"grammar_score":100,"total_score":999,
        "structure_feedback":"Clair","vocabulary_feedback":"Riche","grammar_feedback":"Quelques fautes",
        "suggestions":["Relisez les accords"]}"#;
    let local = ScriptedProvider::new("Local", true, vec![Ok(reply)]);
    let prompts = local.prompts.clone();
    let dispatcher = dispatcher(PolicyMode::Local, local, ScriptedProvider::down("Cloud"));
    let generator = ContentGenerator::new(&dispatcher);

    let grade = generator.grade_essay("Madame, Monsieur, je vous écris...", "Section B").await;
    assert_eq!(grade.vocabulary_score, 150);
    assert_eq!(grade.total_score, 390);
    assert_eq!(grade.suggestions.len(), 1);

    let (prompt, _) = prompts.lock().unwrap()[0].clone();
    assert!(prompt.contains("Madame, Monsieur, je vous écris..."));
}

#[tokio::test]
async fn fractional_essay_scores_are_kept_without_failover() {
    let reply = r#"{"structure_score":120.5,"vocabulary_score":110,"grammar_score":"99.6","total_score":330.1,
        "structure_feedback":"Bien organisé","vocabulary_feedback":"Varié","grammar_feedback":"Correct",
        "suggestions":[]}"#;
    let local = ScriptedProvider::new("Local", true, vec![Ok(reply)]);
    let cloud = ScriptedProvider::new("Cloud", true, Vec::new());
    let cloud_calls = cloud.calls.clone();
    let dispatcher = dispatcher(PolicyMode::Auto, local, cloud);
    let generator = ContentGenerator::new(&dispatcher);

    let grade = generator.grade_essay("Hier soir, dans notre quartier...", "Section A").await;
    assert_eq!(grade.structure_score, 121);
    assert_eq!(grade.grammar_score, 100);
    assert_eq!(grade.total_score, 331);
    assert_eq!(grade.structure_feedback, "Bien organisé");
    assert_eq!(cloud_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn text_generators_report_exhaustion() {
    let local = ScriptedProvider::new("Local (gemma3:4b)", true, vec![Err("connection refused")]);
    let cloud = ScriptedProvider::new("Cloud (gemma-3-27b-it)", true, vec![Err("401 Unauthorized")]);
    let cloud_calls = cloud.calls.clone();
    let dispatcher = dispatcher(PolicyMode::Auto, local, cloud);
    let generator = ContentGenerator::new(&dispatcher);

    let answer = generator.explain_grammar("le subjonctif").await;
    assert_eq!(
        answer,
        "Error: All AI providers failed. Last error: Backend error: 401 Unauthorized"
    );
    assert_eq!(cloud_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn speaking_and_tutor_use_expected_prompts() {
    let local = ScriptedProvider::new(
        "Local",
        true,
        vec![Ok("  Parlez de votre ville.  \n"), Ok("Le TEF dure environ 3 heures.")],
    );
    let prompts = local.prompts.clone();
    let dispatcher = dispatcher(PolicyMode::Local, local, ScriptedProvider::down("Cloud"));
    let generator = ContentGenerator::new(&dispatcher);

    assert_eq!(generator.speaking_question("B2").await, "Parlez de votre ville.");
    assert_eq!(
        generator.ask_tutor("Combien de temps dure le TEF ?").await,
        "Le TEF dure environ 3 heures."
    );

    let prompts = prompts.lock().unwrap();
    assert_eq!(
        prompts[0].0,
        "Generate one TEF speaking question (Level B2). Return ONLY text."
    );
    assert!(prompts[0].1.is_empty());
    assert_eq!(prompts[1].0, "Combien de temps dure le TEF ?");
    assert!(prompts[1].1.starts_with("You are a helpful TEF tutor."));
}

#[tokio::test]
async fn reading_article_sets_level_in_system_prompt() {
    let local = ScriptedProvider::new("Local", true, vec![Ok("Le marché de Noël...")]);
    let prompts = local.prompts.clone();
    let dispatcher = dispatcher(PolicyMode::Local, local, ScriptedProvider::down("Cloud"));
    let generator = ContentGenerator::new(&dispatcher);

    let article = generator.reading_article("les marchés de Noël", "A2").await;
    assert_eq!(article, "Le marché de Noël...");

    let (prompt, system) = prompts.lock().unwrap()[0].clone();
    assert_eq!(prompt, "Write a 200-word article in French about: les marchés de Noël.");
    assert_eq!(system, "Write clear, natural French at A2 level.");
}

#[tokio::test]
async fn status_reflects_policy() {
    let forced_local = dispatcher(
        PolicyMode::Local,
        ScriptedProvider::down("Local (gemma3:4b)"),
        ScriptedProvider::new("Cloud (gemma-3-27b-it)", true, Vec::new()),
    );
    assert_eq!(
        ContentGenerator::new(&forced_local).status().await,
        "No AI Connected (Start Ollama or set API Key)"
    );

    let auto = dispatcher(
        PolicyMode::Auto,
        ScriptedProvider::new("Local (gemma3:4b)", true, Vec::new()),
        ScriptedProvider::new("Cloud (gemma-3-27b-it)", true, Vec::new()),
    );
    assert_eq!(
        ContentGenerator::new(&auto).status().await,
        "Connected: Local (gemma3:4b)"
    );
}

#[tokio::test]
async fn quiz_flow_awards_xp_once_and_unlocks_next_weeks() {
    let dir = TempDir::new().unwrap();
    let store = assert_ok!(JsonProgressStore::open(dir.path().join("progress.json")).await);

    assert!(!store.is_week_unlocked(4).await.unwrap());

    let first = award_question_xp(&store, "w1-grammar-je-suis", 1, ModuleType::Grammar, 10).await;
    assert!(assert_ok!(first));
    let repeat = award_question_xp(&store, "w1-grammar-je-suis", 1, ModuleType::Grammar, 10).await;
    assert!(!assert_ok!(repeat));

    assert_ok!(store.save_progress(1, ModuleType::Grammar, true, Some(100)).await);
    assert_eq!(store.total_xp().await.unwrap(), 10);
    assert!(store.is_week_unlocked(4).await.unwrap());
    assert_eq!(store.streak().await.unwrap().current, 1);
}

#[tokio::test]
async fn corrupt_progress_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("progress.json");
    std::fs::write(&path, r#"{"xp_history": 42}"#).unwrap();

    assert_err!(JsonProgressStore::open(&path).await);
}
