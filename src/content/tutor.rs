use super::ContentGenerator;
use crate::llm::GenerationRequest;
use tracing::info;

const TUTOR_SYSTEM_PROMPT: &str = "You are a helpful TEF tutor. Use the provided context to answer accurately.";

impl ContentGenerator<'_> {
    /// Open question to the tutor, answered with web context when available
    pub async fn ask_tutor(&self, query: &str) -> String {
        info!("🎓 Tutor question: {}", query);
        let request = GenerationRequest::text(query)
            .with_system(TUTOR_SYSTEM_PROMPT)
            .with_search(true);

        self.dispatcher.dispatch(&request).await.into_text()
    }

    pub async fn speaking_question(&self, level: &str) -> String {
        let prompt = format!("Generate one TEF speaking question (Level {}). Return ONLY text.", level);
        let request = GenerationRequest::text(prompt);

        self.dispatcher.dispatch(&request).await.into_text().trim().to_string()
    }
}
