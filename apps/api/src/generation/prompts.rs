// All LLM prompt templates for the Generation module.
// Reuses cross-cutting fragments from llm_client::prompts.
//
// The instruction wording is what the backend is asked to follow; the
// validators in generation::validator are what actually enforce it.

use crate::llm_client::prompts::{BULLET, JSON_ONLY_RULES, PLAIN_TEXT_RULES};
use crate::models::content::ContentType;
use crate::models::facts::{Experience, UserFacts};

/// Section headers that appear in the prompts and sometimes leak back into
/// free-text answers.
pub const INSTRUCTION_HEADERS: &[&str] = &[
    "USER PROFILE:",
    "INTERNSHIPS:",
    "SKILLS:",
    "MILESTONES:",
    "INSTRUCTIONS:",
    "REQUIREMENTS:",
    "EXAMPLE FORMAT:",
    "Example format:",
];

/// Resume feedback prompt. Replace: {profile}, {bullet}, {json_rules}
pub const RESUME_FEEDBACK_PROMPT_TEMPLATE: &str = r#"You are a professional resume reviewer. Your task is to provide resume feedback in JSON format.

{profile}

INSTRUCTIONS:
1. Analyze the information above
2. Respond with ONLY a JSON object
3. Do not include any other text, markdown, or formatting
4. Use exactly this format:

{
    "general": "Write a detailed paragraph about overall assessment",
    "strengths": "{bullet} First strength\n{bullet} Second strength\n{bullet} Third strength",
    "improvements": "{bullet} First improvement\n{bullet} Second improvement\n{bullet} Third improvement"
}

Remember:
{json_rules}
- Start each bullet point with {bullet}"#;

/// Career advice prompt. Replace: {profile}, {bullet}, {json_rules}
pub const CAREER_ADVICE_PROMPT_TEMPLATE: &str = r#"You are a career advisor. Based on the following user information, provide CONCISE career advice in EXACTLY the requested JSON format.

{profile}

INSTRUCTIONS:
1. Analyze the information above
2. Provide advice in EXACTLY this JSON format, with no other text:
{
    "certifications": "2-3 specific certification recommendations, max 100 chars",
    "skills": "3-4 specific skills to develop, max 100 chars",
    "tips": "3 bullet points for job success, use {bullet} for bullets, max 150 chars"
}

REQUIREMENTS:
{json_rules}
- Keep each field under the specified length
- For 'tips' field, use bullet points with {bullet} symbol
- Be specific and actionable
- Focus on user's field/experience"#;

/// Roadmap prompt. Asks for plain text, not JSON. Replace: {profile}, {text_rules}
pub const ROADMAP_PROMPT_TEMPLATE: &str = r#"You are a career advisor. Based on the following user information, generate THREE career roadmap steps showing a clear progression path.

{profile}

INSTRUCTIONS:
Generate THREE career steps in this format:
[Job Title 1]

[Brief description of key skills and steps for this role - max 150 chars]

[Job Title 2]

[Brief description of key skills and steps for this role - max 150 chars]

[Job Title 3]

[Brief description of key skills and steps for this role - max 150 chars]

Example format for each step:
Junior Data Analyst

Learn Python, SQL, and data visualization. Build dashboards and analyze data. Create a portfolio with 2-3 data analysis projects.

REQUIREMENTS:
- Generate exactly 3 job titles with descriptions
- Each job title must be max 50 chars
- Each description must be max 150 chars
- Show a clear progression path from entry to advanced level
- Be specific and actionable
- Focus on user's current experience level
{text_rules}"#;

/// Builds the prompt for `content_type`. Pure and deterministic: equal facts
/// always give byte-identical prompts, which keeps cache fingerprints stable.
pub fn build_prompt(facts: &UserFacts, content_type: ContentType) -> String {
    let profile = render_profile(facts);
    match content_type {
        ContentType::ResumeFeedback => RESUME_FEEDBACK_PROMPT_TEMPLATE
            .replace("{json_rules}", JSON_ONLY_RULES)
            .replace("{bullet}", BULLET)
            .replace("{profile}", &profile),
        ContentType::CareerAdvice => CAREER_ADVICE_PROMPT_TEMPLATE
            .replace("{json_rules}", JSON_ONLY_RULES)
            .replace("{bullet}", BULLET)
            .replace("{profile}", &profile),
        ContentType::DetailedRoadmap => ROADMAP_PROMPT_TEMPLATE
            .replace("{text_rules}", PLAIN_TEXT_RULES)
            .replace("{profile}", &profile),
    }
}

// Rendered in one pass so user text is never scanned for placeholders.
fn render_profile(facts: &UserFacts) -> String {
    format!(
        "USER PROFILE:\nEmail: {}\n\nINTERNSHIPS:\n{}\n\nSKILLS:\n{}\n\nMILESTONES:\n{}",
        facts.identifier,
        format_experiences(&facts.internships),
        format_skills(&facts.skills),
        format_experiences(&facts.milestones),
    )
}

/// Numbered list of experiences, or "None".
pub fn format_experiences(experiences: &[Experience]) -> String {
    if experiences.is_empty() {
        return "None".to_string();
    }
    experiences
        .iter()
        .enumerate()
        .map(|(i, exp)| exp.render(i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_skills(skills: &[String]) -> String {
    if skills.is_empty() {
        "Not provided".to_string()
    } else {
        skills.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_facts;

    #[test]
    fn test_empty_facts_render_placeholders() {
        let prompt = build_prompt(&UserFacts::new("x@y.z"), ContentType::ResumeFeedback);
        assert!(prompt.contains("Email: x@y.z"));
        assert!(prompt.contains("INTERNSHIPS:\nNone"));
        assert!(prompt.contains("MILESTONES:\nNone"));
        assert!(prompt.contains("SKILLS:\nNot provided"));
    }

    #[test]
    fn test_experiences_are_numbered() {
        let prompt = build_prompt(&sample_facts(), ContentType::CareerAdvice);
        assert!(prompt.contains(
            "1. Data Intern at Acme Analytics (Jun 2024 - Aug 2024): Built churn dashboards for the sales team"
        ));
        assert!(prompt.contains("1. Kaggle bronze medal (2024-11-02): No description provided"));
        assert!(prompt.contains("Python, SQL, Tableau"));
    }

    #[test]
    fn test_json_prompts_name_every_field() {
        let facts = sample_facts();
        let feedback = build_prompt(&facts, ContentType::ResumeFeedback);
        for field in ["\"general\"", "\"strengths\"", "\"improvements\""] {
            assert!(feedback.contains(field));
        }
        let advice = build_prompt(&facts, ContentType::CareerAdvice);
        for field in ["\"certifications\"", "\"skills\"", "\"tips\"", "max 100 chars", "max 150 chars"] {
            assert!(advice.contains(field));
        }
        assert!(advice.contains("use • for bullets"));
        assert!(!advice.contains("{bullet}"));
    }

    #[test]
    fn test_roadmap_prompt_asks_for_plain_text() {
        let prompt = build_prompt(&sample_facts(), ContentType::DetailedRoadmap);
        assert!(prompt.contains("Each job title must be max 50 chars"));
        assert!(prompt.contains("No bullet points or special formatting"));
        assert!(!prompt.contains("Only output valid JSON"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let facts = sample_facts();
        assert_eq!(
            build_prompt(&facts, ContentType::DetailedRoadmap),
            build_prompt(&facts, ContentType::DetailedRoadmap)
        );
    }

    #[test]
    fn test_user_text_with_placeholder_syntax_is_not_expanded() {
        let facts = UserFacts::new("{skills}@example.com");
        let prompt = build_prompt(&facts, ContentType::ResumeFeedback);
        assert!(prompt.contains("Email: {skills}@example.com"));
    }
}
