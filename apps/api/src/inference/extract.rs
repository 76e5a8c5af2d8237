//! Extraction request builder. Resume text in, structured profile out.

use tracing::info;

use crate::inference::prompts::extraction_prompt;
use crate::inference::recovery::recover;
use crate::inference::{generated_text, InferenceError, TextGenerator};
use crate::models::candidate::ExtractedProfile;

/// Asks `model` to structure `resume_text` and recovers a profile from its output.
///
/// Transport failures and non-success statuses are returned as errors; an
/// unparseable response is not an error and yields the sentinel profile.
pub async fn extract_profile(
    generator: &dyn TextGenerator,
    model: &str,
    resume_text: &str,
) -> Result<ExtractedProfile, InferenceError> {
    let prompt = extraction_prompt(resume_text);
    let envelope = generator.generate(model, &prompt).await?;
    let raw = generated_text(&envelope);

    let profile = recover(&raw);
    info!(
        "Extraction via {model} produced {} skills, {} education and {} experience entries",
        profile.skills.len(),
        profile.education.len(),
        profile.experience.len()
    );
    Ok(profile)
}
