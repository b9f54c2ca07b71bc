//! Static fallback content served when generation cannot produce a valid
//! result within its attempt budget.
//!
//! The catalog is loaded once at startup and never mutated. Every entry is
//! checked against its content type's validator before the service starts,
//! so fallback results always have the same shape as generated ones.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::generation::validator::{
    validate_array, validate_fields, CAREER_ADVICE_RULES, RESUME_FEEDBACK_RULES,
    ROADMAP_STEP_COUNT, ROADMAP_STEP_RULES,
};
use crate::models::content::{CareerAdvice, ResumeFeedback, Roadmap, RoadmapStep};
#[cfg(test)]
use crate::models::content::{ContentType, GeneratedContent};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FallbackCatalog {
    pub resume_feedback: ResumeFeedback,
    pub career_advice: CareerAdvice,
    pub detailed_roadmap: Roadmap,
}

impl FallbackCatalog {
    pub fn builtin() -> Self {
        Self {
            resume_feedback: ResumeFeedback {
                general: "We're currently unable to provide personalized resume feedback. \
                          Please try again later."
                    .to_string(),
                strengths: "• Unable to analyze strengths at this time\n• Please try again later"
                    .to_string(),
                improvements:
                    "• Unable to suggest improvements at this time\n• Please try again later"
                        .to_string(),
            },
            career_advice: CareerAdvice {
                certifications: "Certification recommendations are unavailable right now. \
                                 Please try again later."
                    .to_string(),
                skills: "Skill recommendations are unavailable right now. Please try again later."
                    .to_string(),
                tips: "• Unable to provide tips at this time\n• Please try again later".to_string(),
            },
            detailed_roadmap: Roadmap(vec![
                RoadmapStep {
                    title: "Junior Data Analyst".to_string(),
                    description: "Learn Python, SQL, and data visualization. Build dashboards \
                                  and analyze data. Create a portfolio with 2-3 data analysis \
                                  projects."
                        .to_string(),
                },
                RoadmapStep {
                    title: "Senior Data Analyst".to_string(),
                    description: "Master advanced analytics, statistical modeling, and data \
                                  pipeline design. Lead data projects and mentor junior analysts."
                        .to_string(),
                },
                RoadmapStep {
                    title: "Data Science Team Lead".to_string(),
                    description: "Drive data strategy, manage analytics teams, and implement ML \
                                  solutions. Collaborate with stakeholders on high-impact projects."
                        .to_string(),
                },
            ]),
        }
    }

    /// Reads a JSON catalog with `resume_feedback`, `career_advice` and
    /// `detailed_roadmap` keys.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fallback catalog {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse fallback catalog {}", path.display()))
    }

    /// The built-in catalog, or the one at `path` when given. Either way the
    /// result has passed `validate`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let catalog = match path {
            Some(path) => {
                info!("Loading fallback catalog from {}", path.display());
                Self::from_file(path)?
            }
            None => Self::builtin(),
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Runs each entry through the same validator generated content must pass,
    /// and requires the validator to leave it unchanged.
    pub fn validate(&self) -> Result<()> {
        let feedback: ResumeFeedback = validate_fields(
            &serde_json::to_value(&self.resume_feedback)?,
            RESUME_FEEDBACK_RULES,
        )
        .context("Fallback resume feedback does not satisfy its schema")?;

        let advice: CareerAdvice = validate_fields(
            &serde_json::to_value(&self.career_advice)?,
            CAREER_ADVICE_RULES,
        )
        .context("Fallback career advice does not satisfy its schema")?;

        let steps: Vec<Value> = self
            .detailed_roadmap
            .steps()
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<_, _>>()?;
        if steps.len() != ROADMAP_STEP_COUNT {
            anyhow::bail!(
                "Fallback roadmap must have exactly {ROADMAP_STEP_COUNT} steps, found {}",
                steps.len()
            );
        }
        let roadmap: Vec<RoadmapStep> =
            validate_array(&steps, ROADMAP_STEP_RULES, ROADMAP_STEP_COUNT)
                .context("Fallback roadmap does not satisfy its schema")?;

        if feedback != self.resume_feedback
            || advice != self.career_advice
            || roadmap != self.detailed_roadmap.0
        {
            anyhow::bail!("Fallback catalog entries must already be normalized (bullets, lengths)");
        }
        Ok(())
    }

    /// The entry for `content_type`, wrapped the way the generators return it.
    #[cfg(test)]
    pub fn entry(&self, content_type: ContentType) -> GeneratedContent {
        match content_type {
            ContentType::ResumeFeedback => {
                GeneratedContent::ResumeFeedback(self.resume_feedback.clone())
            }
            ContentType::CareerAdvice => GeneratedContent::CareerAdvice(self.career_advice.clone()),
            ContentType::DetailedRoadmap => {
                GeneratedContent::DetailedRoadmap(self.detailed_roadmap.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_builtin_catalog_satisfies_every_schema() {
        FallbackCatalog::builtin().validate().unwrap();
    }

    #[test]
    fn test_entry_matches_content_type() {
        let catalog = FallbackCatalog::builtin();
        for content_type in [
            ContentType::ResumeFeedback,
            ContentType::CareerAdvice,
            ContentType::DetailedRoadmap,
        ] {
            assert_eq!(catalog.entry(content_type).content_type(), content_type);
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut catalog = serde_json::to_value(FallbackCatalog::builtin().entry_values()).unwrap();
        catalog["career_advice"]["skills"] = Value::String("Keep learning SQL".to_string());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{catalog}").unwrap();

        let loaded = FallbackCatalog::load(Some(file.path())).unwrap();
        assert_eq!(loaded.career_advice.skills, "Keep learning SQL");
    }

    #[test]
    fn test_load_rejects_two_step_roadmap() {
        let mut catalog = serde_json::to_value(FallbackCatalog::builtin().entry_values()).unwrap();
        catalog["detailed_roadmap"]
            .as_array_mut()
            .unwrap()
            .truncate(2);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{catalog}").unwrap();

        assert!(FallbackCatalog::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_validate_rejects_unbulleted_tips() {
        let mut catalog = FallbackCatalog::builtin();
        catalog.career_advice.tips = "Network often".to_string();
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(FallbackCatalog::load(Some(Path::new("/nonexistent/catalog.json"))).is_err());
    }

    impl FallbackCatalog {
        fn entry_values(&self) -> Value {
            serde_json::json!({
                "resume_feedback": self.resume_feedback,
                "career_advice": self.career_advice,
                "detailed_roadmap": self.detailed_roadmap,
            })
        }
    }
}
