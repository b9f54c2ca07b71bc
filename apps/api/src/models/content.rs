use std::fmt;

use serde::{Deserialize, Serialize};

/// The three kinds of AI-generated career content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    ResumeFeedback,
    CareerAdvice,
    DetailedRoadmap,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::ResumeFeedback => "resume_feedback",
            ContentType::CareerAdvice => "career_advice",
            ContentType::DetailedRoadmap => "detailed_roadmap",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `strengths` and `improvements` are newline-joined bullet lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeFeedback {
    pub general: String,
    pub strengths: String,
    pub improvements: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerAdvice {
    /// At most 100 characters.
    pub certifications: String,
    /// At most 100 characters.
    pub skills: String,
    /// Bulleted, at most 150 characters.
    pub tips: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapStep {
    /// At most 50 characters.
    pub title: String,
    /// At most 150 characters, ellipsised when clipped.
    pub description: String,
}

/// Exactly three steps, ordered from entry level to advanced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roadmap(pub Vec<RoadmapStep>);

impl Roadmap {
    pub fn steps(&self) -> &[RoadmapStep] {
        &self.0
    }
}

/// A generated result of any content type. Serializes as the bare inner value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GeneratedContent {
    ResumeFeedback(ResumeFeedback),
    CareerAdvice(CareerAdvice),
    DetailedRoadmap(Roadmap),
}

impl GeneratedContent {
    #[cfg(test)]
    pub fn content_type(&self) -> ContentType {
        match self {
            GeneratedContent::ResumeFeedback(_) => ContentType::ResumeFeedback,
            GeneratedContent::CareerAdvice(_) => ContentType::CareerAdvice,
            GeneratedContent::DetailedRoadmap(_) => ContentType::DetailedRoadmap,
        }
    }
}
