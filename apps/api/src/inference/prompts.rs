// Prompt templates for the inference endpoint.
// Inputs are embedded verbatim; nothing is escaped or truncated.

pub const EXTRACTION_PROMPT_TEMPLATE: &str = r#"
Extract the following information from the resume text provided below.
Return the information as a valid JSON object. Do not include any text before or after the JSON object.

The JSON object should have the following keys:
- "introduction": A brief introduction of the candidate.
- "education": A list of education objects. Each object should have the keys "institution", "degree", "start_date", and "end_date".
- "experience": A list of experience objects. Each object should have the keys "company", "position", "start_date", "end_date", and "description".
- "skills": A list of strings, where each string is a skill.
- "projects": A list of strings, where each string is a project description.
- "certifications": A list of strings, where each string is a certification.
- "hobbies": A list of strings, where each string is a hobby.

If any information is not found, return an empty list or an empty string for the corresponding key.

Resume text:
---
{resume_text}
---

JSON output:
"#;

pub const QUESTION_INSTRUCTIONS: &str = "\
You are an assistant answering questions about a candidate.
Use ONLY the provided JSON context to answer. If information is not present, say 'Information not found'.";

pub fn extraction_prompt(resume_text: &str) -> String {
    EXTRACTION_PROMPT_TEMPLATE.replace("{resume_text}", resume_text)
}

/// Formatted rather than templated: the context is JSON and full of braces.
pub fn question_prompt(question: &str, context_json: &str) -> String {
    format!("{QUESTION_INSTRUCTIONS}\n\nContext JSON:\n{context_json}\n\nQuestion:\n{question}\n\nAnswer:")
}
