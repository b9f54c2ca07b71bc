// Shared prompt constants and prompt-building utilities.
// Each content type defines its own template in generation/prompts.rs.
// This file contains cross-cutting prompt fragments.

/// Glyph that opens every bullet line in generated content.
pub const BULLET: &str = "•";

/// Output rules appended to every prompt that expects a JSON object.
pub const JSON_ONLY_RULES: &str = "\
- Only output valid JSON
- No text before or after the JSON
- No markdown, no code fences
- Use proper escaping for newlines (\\n)";

/// Output rules for prompts that expect plain text paragraphs.
pub const PLAIN_TEXT_RULES: &str = "\
- No bullet points or special formatting
- Do not include any instructions or user profile in the response
- ONLY output the job titles and descriptions, nothing else";
