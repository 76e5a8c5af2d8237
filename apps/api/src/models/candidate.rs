use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Introduction written into the profile when the model output could not be parsed.
pub const UNPARSEABLE_INTRODUCTION: &str = "Could not parse extracted data.";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    #[serde(deserialize_with = "lenient::string")]
    pub institution: String,
    #[serde(deserialize_with = "lenient::string")]
    pub degree: String,
    #[serde(deserialize_with = "lenient::string")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient::string")]
    pub end_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    #[serde(deserialize_with = "lenient::string")]
    pub company: String,
    #[serde(deserialize_with = "lenient::string")]
    pub position: String,
    #[serde(deserialize_with = "lenient::string")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient::string")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient::string")]
    pub description: String,
}

/// Structured candidate data as produced by the extraction model.
///
/// Every field is optional on the way in: a key the model left out, or set to
/// `null`, becomes its empty default. `error_info` carries the raw model text
/// when recovery failed; `error` is set when the inference call itself failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedProfile {
    #[serde(deserialize_with = "lenient::string")]
    pub introduction: String,
    #[serde(deserialize_with = "lenient::entries")]
    pub education: Vec<EducationEntry>,
    #[serde(deserialize_with = "lenient::entries")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(deserialize_with = "lenient::strings")]
    pub skills: Vec<String>,
    #[serde(deserialize_with = "lenient::strings")]
    pub projects: Vec<String>,
    #[serde(deserialize_with = "lenient::strings")]
    pub certifications: Vec<String>,
    #[serde(deserialize_with = "lenient::strings")]
    pub hobbies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractedProfile {
    /// The sentinel profile for model output that no recovery attempt could parse.
    pub fn unparseable(raw_model_text: &str) -> Self {
        Self {
            introduction: UNPARSEABLE_INTRODUCTION.to_string(),
            error_info: Some(raw_model_text.to_string()),
            ..Self::default()
        }
    }

    /// An empty profile tagged with the reason model extraction failed.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub file_name: String,
    pub public_url: String,
    pub uploaded_at: DateTime<Utc>,
}

/// The persisted representation of one uploaded resume. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub candidate_id: String,
    #[serde(default)]
    pub introduction: String,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub hobbies: Vec<String>,
    #[serde(default)]
    pub raw_text: String,
    pub metadata: FileMetadata,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CandidateRecord {
    pub fn new(
        candidate_id: String,
        profile: ExtractedProfile,
        raw_text: String,
        metadata: FileMetadata,
    ) -> Self {
        let ExtractedProfile {
            introduction,
            education,
            experience,
            skills,
            projects,
            certifications,
            hobbies,
            error_info,
            error,
        } = profile;

        Self {
            candidate_id,
            introduction,
            education,
            experience,
            skills,
            projects,
            certifications,
            hobbies,
            raw_text,
            metadata,
            created_at: Utc::now(),
            error_info,
            error,
        }
    }

    /// The subset of the record handed to the model as question-answering context.
    pub fn question_context(&self) -> Value {
        json!({
            "education": self.education,
            "experience": self.experience,
            "skills": self.skills,
            "projects": self.projects,
            "certifications": self.certifications,
            "hobbies": self.hobbies,
            "introduction": self.introduction,
        })
    }
}

/// Row shape returned by the candidate listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub candidate_id: String,
    pub introduction: String,
    pub skills: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Tolerant field decoders for model-produced JSON.
mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn text_of(value: Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s,
            other => other.to_string(),
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(text_of(Value::deserialize(deserializer)?))
    }

    pub fn strings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .filter(|v| !v.is_null())
                .map(text_of)
                .collect(),
            Value::Null => Vec::new(),
            Value::String(s) if s.trim().is_empty() => Vec::new(),
            other => vec![text_of(other)],
        })
    }

    pub fn entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .filter(Value::is_object)
                .filter_map(|v| serde_json::from_value(v).ok())
                .collect(),
            single @ Value::Object(_) => serde_json::from_value(single).into_iter().collect(),
            _ => Vec::new(),
        })
    }
}
