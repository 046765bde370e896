//! TEF Master
//!
//! Preparation tracker for the TEF French exam. Practice material is generated
//! by a local (Ollama) or cloud (Gemini/Gemma) model through a hybrid
//! dispatcher with failover and optional web search grounding.

pub mod config;
pub mod content;
pub mod curriculum;
pub mod llm;
pub mod progress;
pub mod search;

// Re-export main types for easy access
pub use crate::config::{Config, ConfigBuilder};
pub use crate::content::{AnswerGrade, ContentGenerator, EssayGrade, FillInBlankQuestion, ReadingQuestion};
pub use crate::curriculum::{CefrLevel, Resource, SyllabusWeek, WritingPrompt};
pub use crate::llm::{GenerationMode, GenerationOutcome, GenerationRequest, HybridDispatcher, LLMError, PolicyMode, LLM};
pub use crate::progress::{JsonProgressStore, ModuleType, ProgressStore};
pub use crate::search::{SearchAugmenter, SearchBackend, SearchResult};
