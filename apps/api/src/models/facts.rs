use serde::Serialize;
use serde_json::{Map, Value};

/// Placeholder for an absent name, role, or date.
pub const UNKNOWN: &str = "Unknown";
/// Placeholder for an absent free-text description.
pub const NO_DESCRIPTION: &str = "No description provided";

/// One career-history fact. The variant is decided once, when the record is
/// ingested, and never re-probed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Experience {
    Internship {
        company: String,
        role: String,
        dates: String,
        description: String,
    },
    Milestone {
        title: String,
        date: String,
        description: String,
    },
}

impl Experience {
    pub fn internship(
        company: Option<String>,
        role: Option<String>,
        dates: Option<String>,
        description: Option<String>,
    ) -> Self {
        Experience::Internship {
            company: or_placeholder(company, UNKNOWN),
            role: or_placeholder(role, UNKNOWN),
            dates: or_placeholder(dates, UNKNOWN),
            description: or_placeholder(description, NO_DESCRIPTION),
        }
    }

    pub fn milestone(
        title: Option<String>,
        date: Option<String>,
        description: Option<String>,
    ) -> Self {
        Experience::Milestone {
            title: or_placeholder(title, UNKNOWN),
            date: or_placeholder(date, UNKNOWN),
            description: or_placeholder(description, NO_DESCRIPTION),
        }
    }

    /// Classifies a loosely-shaped JSON record sent by the client.
    ///
    /// A `company` key makes it an internship, a `title` key a milestone.
    /// Records carrying neither are not career facts and yield `None`.
    pub fn from_record(record: &Map<String, Value>) -> Option<Self> {
        if record.contains_key("company") {
            Some(Experience::internship(
                text_field(record, "company"),
                text_field(record, "role"),
                text_field(record, "dates"),
                text_field(record, "description"),
            ))
        } else if record.contains_key("title") {
            Some(Experience::milestone(
                text_field(record, "title"),
                text_field(record, "date"),
                text_field(record, "description"),
            ))
        } else {
            None
        }
    }

    /// One prompt line, numbered from 1.
    pub fn render(&self, index: usize) -> String {
        match self {
            Experience::Internship {
                company,
                role,
                dates,
                description,
            } => format!("{index}. {role} at {company} ({dates}): {description}"),
            Experience::Milestone {
                title,
                date,
                description,
            } => format!("{index}. {title} ({date}): {description}"),
        }
    }
}

/// Everything the core knows about a user. Read-only to the generators.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserFacts {
    pub identifier: String,
    pub internships: Vec<Experience>,
    pub milestones: Vec<Experience>,
    pub skills: Vec<String>,
}

impl UserFacts {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Self::default()
        }
    }

    /// Replaces the skill list, dropping blanks and repeated entries while
    /// keeping first-seen order.
    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.skills.clear();
        for skill in skills {
            let skill = skill.as_ref().trim();
            if !skill.is_empty() && !self.skills.iter().any(|s| s == skill) {
                self.skills.push(skill.to_string());
            }
        }
        self
    }
}

/// Classifies a batch of raw client records, silently skipping unrecognised ones.
pub fn ingest_records(records: &[Map<String, Value>]) -> Vec<Experience> {
    records.iter().filter_map(Experience::from_record).collect()
}

fn or_placeholder(value: Option<String>, placeholder: &str) -> String {
    value.unwrap_or_else(|| placeholder.to_string())
}

fn text_field(record: &Map<String, Value>, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
