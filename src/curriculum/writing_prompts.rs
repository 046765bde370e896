use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Written production task with hints for the learner and the grader
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WritingPrompt {
    pub id: &'static str,
    pub task_type: &'static str,
    pub topic: &'static str,
    pub prompt: &'static str,
    /// Minimum expected length
    pub word_count: u32,
    /// Tenses or structures the task exercises
    pub grammar_focus: &'static [&'static str],
    /// Vocabulary (Section A) or arguments (Section B) to work in
    pub key_points: &'static [&'static str],
    /// Expected document form, when the task imposes one
    pub structure: Option<&'static str>,
    pub structure_hints: &'static str,
}

pub static WRITING_PROMPTS: &[WritingPrompt] = &[
    WritingPrompt {
        id: "A_01",
        task_type: "Section A - Fait Divers",
        topic: "The Hero Dog",
        prompt: "Un chien réveille sa famille et les sauve d'un incendie. Racontez.",
        word_count: 80,
        grammar_focus: &["Passé Composé", "Imparfait"],
        key_points: &["aboyer", "fumée", "pompiers", "sauver"],
        structure: None,
        structure_hints: "1) Set the scene (Imparfait), 2) Describe the action (Passé Composé), 3) Conclude with the outcome",
    },
    WritingPrompt {
        id: "A_02",
        task_type: "Section A - Fait Divers",
        topic: "The Lottery Surprise",
        prompt: "Un homme jette son ticket de loto par erreur et le retrouve le lendemain. Racontez la suite.",
        word_count: 80,
        grammar_focus: &["Plus-que-parfait", "Passé Composé"],
        key_points: &["ticket", "poubelle", "chance", "millionnaire"],
        structure: None,
        structure_hints: "Use Plus-que-parfait to show what had happened before finding the ticket",
    },
    WritingPrompt {
        id: "A_03",
        task_type: "Section A - Fait Divers",
        topic: "The Good Samaritan",
        prompt: "Une vieille dame perd son sac et un jeune homme le lui rapporte intact. Racontez l'histoire.",
        word_count: 80,
        grammar_focus: &["Passé Composé", "Imparfait"],
        key_points: &["perdre", "rapporter", "honnêteté", "remercier"],
        structure: None,
        structure_hints: "Focus on the sequence of events and the emotional impact",
    },
    WritingPrompt {
        id: "B_01",
        task_type: "Section B - Formal Letter",
        topic: "Free Museums",
        prompt: "Vous avez lu que tous les musées devraient être gratuits. Écrivez au journal pour donner votre opinion.",
        word_count: 200,
        grammar_focus: &["Subjunctive", "Connectors"],
        key_points: &["Culture for all", "Economic cost", "Education"],
        structure: Some("Formal Letter"),
        structure_hints: "1) Opening formula, 2) State position, 3) 2-3 arguments with connectors, 4) Conclusion, 5) Closing formula",
    },
    WritingPrompt {
        id: "B_02",
        task_type: "Section B - Formal Letter",
        topic: "Smartphones in Schools",
        prompt: "Un article propose d'interdire les portables au lycée. Vous réagissez.",
        word_count: 200,
        grammar_focus: &["Conditional (Suggestion)", "Subjunctive"],
        key_points: &["Concentration", "Cyberbullying", "Pedagogical tool"],
        structure: Some("Formal Letter"),
        structure_hints: "Use 'Il serait préférable que...', 'Bien que...', etc.",
    },
    WritingPrompt {
        id: "B_03",
        task_type: "Section B - Formal Letter",
        topic: "Work from Home",
        prompt: "Votre entreprise veut rendre le télétravail obligatoire. Vous écrivez au DRH pour exprimer votre désaccord.",
        word_count: 200,
        grammar_focus: &["Polite refusal", "Logical connectors"],
        key_points: &["Social isolation", "Team spirit", "Work-life balance"],
        structure: Some("Formal Letter"),
        structure_hints: "Use polite conditional: 'Je souhaiterais...', 'Il me semble que...'",
    },
    WritingPrompt {
        id: "A_04",
        task_type: "Section A - Fait Divers",
        topic: "Traffic Accident",
        prompt: "Un accident de voiture s'est produit à un carrefour très fréquenté. Décrivez les faits.",
        word_count: 80,
        grammar_focus: &["Passé Composé", "Imparfait"],
        key_points: &["carrefour", "percuter", "blessé", "urgences"],
        structure: None,
        structure_hints: "Who, what, when, where - classic news style",
    },
    WritingPrompt {
        id: "B_04",
        task_type: "Section B - Complaint Letter",
        topic: "Defective Product",
        prompt: "Vous avez acheté un produit défectueux. Écrivez à l'entreprise pour vous plaindre et demander une solution.",
        word_count: 200,
        grammar_focus: &["Conditional (polite request)", "Past tenses"],
        key_points: &["Description of problem", "Impact", "Expected resolution"],
        structure: Some("Formal Letter"),
        structure_hints: "Formal opening, state facts, express disappointment politely, request action",
    },
    WritingPrompt {
        id: "B_05",
        task_type: "Section B - Invitation Response",
        topic: "Wedding Invitation",
        prompt: "Un ami vous invite à son mariage, mais vous ne pouvez pas y assister. Écrivez pour expliquer pourquoi et vous excuser.",
        word_count: 80,
        grammar_focus: &["Future proche", "Conditional"],
        key_points: &["Apology", "Reason", "Good wishes"],
        structure: Some("Informal Letter/Email"),
        structure_hints: "Warm opening, sincere apology, brief explanation, congratulations",
    },
];

pub fn all_prompts() -> &'static [WritingPrompt] {
    WRITING_PROMPTS
}

/// Prompts whose task type contains `task_type`, e.g. "Section A"
pub fn prompts_by_type(task_type: &str) -> Vec<&'static WritingPrompt> {
    WRITING_PROMPTS.iter().filter(|p| p.task_type.contains(task_type)).collect()
}

pub fn prompt_by_id(id: &str) -> Option<&'static WritingPrompt> {
    WRITING_PROMPTS.iter().find(|p| p.id == id)
}

/// Rotates through the matching prompts, one per calendar day
pub fn prompt_of_the_day(task_type: Option<&str>, date: NaiveDate) -> Option<&'static WritingPrompt> {
    let candidates = match task_type {
        Some(task_type) => prompts_by_type(task_type),
        None => WRITING_PROMPTS.iter().collect(),
    };

    if candidates.is_empty() {
        return None;
    }

    let index = date.num_days_from_ce().unsigned_abs() as usize % candidates.len();
    Some(candidates[index])
}
