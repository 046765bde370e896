//! Static course material: the weekly syllabus, the resource directory and
//! the writing prompt bank

pub mod resources;
pub mod syllabus;
pub mod writing_prompts;

pub use resources::{categories, resource_by_id, resources_in_category, search_resources, Resource};
pub use syllabus::{CefrLevel, SyllabusWeek, SYLLABUS};
pub use writing_prompts::{prompt_by_id, prompts_by_type, prompt_of_the_day, WritingPrompt};
