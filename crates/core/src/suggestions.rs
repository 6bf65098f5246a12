use crate::model::TeachingContent;

pub const SIMPLIFY_PROMPT: &str = "Can you explain that in simpler terms?";
pub const FIRST_EXAMPLE_PROMPT: &str = "Walk me through the first example step by step";
pub const HARDEST_CONCEPT_PROMPT: &str = "Which of these concepts is the hardest to master?";

/// Quick-action prompts offered under a freshly delivered lesson.
///
/// Order is fixed: simplify, first example (if any), hardest concept (if
/// any), then a quiz on the topic.
#[must_use]
pub fn follow_up_suggestions(content: &TeachingContent) -> Vec<String> {
    let mut prompts = Vec::with_capacity(4);
    prompts.push(SIMPLIFY_PROMPT.to_string());

    if !content.worked_examples.is_empty() {
        prompts.push(FIRST_EXAMPLE_PROMPT.to_string());
    }

    if !content.key_concepts.is_empty() {
        prompts.push(HARDEST_CONCEPT_PROMPT.to_string());
    }

    prompts.push(quiz_prompt(&content.topic));
    prompts
}

#[must_use]
pub fn quiz_prompt(topic: &str) -> String {
    format!("Quiz me on {topic}")
}
