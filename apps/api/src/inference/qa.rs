//! Question-answering request builder. The answer is free text and is
//! returned as generated, without recovery parsing.

use crate::inference::prompts::question_prompt;
use crate::inference::{generated_text, InferenceError, TextGenerator};

pub async fn answer_question(
    generator: &dyn TextGenerator,
    model: &str,
    question: &str,
    context_json: &str,
) -> Result<String, InferenceError> {
    let prompt = question_prompt(question, context_json);
    let envelope = generator.generate(model, &prompt).await?;
    Ok(generated_text(&envelope).trim().to_string())
}
